use std::collections::VecDeque;

use bytes::Bytes;
use rdm6300_transport::{ByteSource, Result, TransportError};

/// What the next read of a [`ScriptedSource`] sees.
#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Timeout,
    Fail(std::io::ErrorKind),
}

/// Replays data and timeouts in order, then reports end of stream.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    pub fn is_drained(&self) -> bool {
        self.steps.is_empty()
    }
}

impl ByteSource for ScriptedSource {
    fn read_one(&mut self) -> Result<Option<u8>> {
        match self.steps.pop_front() {
            None => Err(TransportError::Closed),
            Some(Step::Timeout) => Ok(None),
            Some(Step::Fail(kind)) => Err(TransportError::Io(kind.into())),
            Some(Step::Data(mut data)) => {
                if data.is_empty() {
                    return self.read_one();
                }
                let byte = data.remove(0);
                if !data.is_empty() {
                    self.steps.push_front(Step::Data(data));
                }
                Ok(Some(byte))
            }
        }
    }

    fn read_up_to(&mut self, n: usize) -> Result<Bytes> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.steps.pop_front() {
                None => break,
                Some(Step::Timeout) => break,
                Some(Step::Fail(kind)) => return Err(TransportError::Io(kind.into())),
                Some(Step::Data(mut data)) => {
                    let take = data.len().min(n - out.len());
                    out.extend(data.drain(..take));
                    if !data.is_empty() {
                        self.steps.push_front(Step::Data(data));
                    }
                }
            }
        }
        Ok(Bytes::from(out))
    }
}

/// A line that never goes quiet and never carries a head marker.
#[derive(Debug, Default)]
pub struct Noise {
    pub reads: usize,
}

impl ByteSource for Noise {
    fn read_one(&mut self) -> Result<Option<u8>> {
        self.reads += 1;
        Ok(Some(0xFF))
    }

    fn read_up_to(&mut self, n: usize) -> Result<Bytes> {
        self.reads += n;
        Ok(Bytes::from(vec![0xFF; n]))
    }
}
