use crate::receiver::MsfReceiver;

/// Builds an MSF receiver
///
/// The defaults reproduce the classic behaviour of an MSF
/// clock: once the receiver locks on, it stays locked and
/// extrapolates the time through any amount of bad signal.
///
/// ```
/// use msftime::MsfReceiverBuilder;
///
/// let rx = MsfReceiverBuilder::new()
///     .with_lock_timeout(10_000)   // give up after 10 s of silence
///     .build();
/// assert_eq!(rx.lock_timeout(), Some(10_000));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MsfReceiverBuilder {
    lock_timeout_ms: Option<u64>,
}

impl MsfReceiverBuilder {
    /// New receiver configuration with defaults
    pub fn new() -> Self {
        Self {
            lock_timeout_ms: None,
        }
    }

    /// Build a receiver
    ///
    /// Once built, the receiver is immediately ready to
    /// process edges.
    pub fn build(&self) -> MsfReceiver {
        MsfReceiver::from(self)
    }

    /// Drop the lock after a period without seconds (ms)
    ///
    /// If `timeout_ms` milliseconds of line activity pass
    /// without an end-of-second, the receiver abandons its
    /// lock and returns to awaiting signal. A new sequence
    /// start is then required before seconds are counted.
    ///
    /// The receiver only learns the time from edges, so a line
    /// which stops toggling altogether is detected at the
    /// next edge. Values shorter than a couple of seconds
    /// will break lock on ordinary signals; we suggest ten
    /// seconds or more.
    pub fn with_lock_timeout(&mut self, timeout_ms: u64) -> &mut Self {
        self.lock_timeout_ms = Some(timeout_ms);
        self
    }

    /// Never drop the lock (default)
    pub fn without_lock_timeout(&mut self) -> &mut Self {
        self.lock_timeout_ms = None;
        self
    }

    /// Lock timeout, in milliseconds, if any
    pub fn lock_timeout(&self) -> Option<u64> {
        self.lock_timeout_ms
    }
}

impl std::default::Default for MsfReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
