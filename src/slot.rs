/// A single fetch-owned data cell.
///
/// Every fetch is tagged with the token returned by [`Slot::begin`]; a response
/// is only applied when its token is still the latest one issued, so a slow
/// reply for an old selection can never overwrite a newer one.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    data: Option<T>,
    loading: bool,
    seq: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            seq: 0,
        }
    }
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_populated(&self) -> bool {
        self.data.is_some()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Starts a new request and returns its token. Existing data is kept until
    /// the response lands.
    pub fn begin(&mut self) -> u64 {
        self.seq += 1;
        self.loading = true;
        self.seq
    }

    /// Drops data and invalidates anything in flight.
    pub fn clear(&mut self) {
        self.data = None;
        self.loading = false;
        self.seq += 1;
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.seq
    }

    /// Replaces the data wholesale. Returns false (and changes nothing) for a
    /// stale token.
    pub fn resolve(&mut self, token: u64, value: T) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.data = Some(value);
        self.loading = false;
        true
    }

    pub fn fail(&mut self, token: u64) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.data = None;
        self.loading = false;
        true
    }
}
