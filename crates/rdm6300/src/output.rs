use rdm6300_frame::{DecodeError, TagRecord};

/// Printed once the device is open and the read loop is about to start.
pub const READY_BANNER: &str = "Ready!";

pub fn print_ready() {
    println!("{READY_BANNER}");
}

pub fn print_tag(tag: &TagRecord) {
    println!("{}", tag.formatted_tag());
}

pub fn print_rejection(err: &DecodeError) {
    println!("{err}");
}
