/// Length of one evaluation window in seconds.
pub const SECONDS_PER_MINUTE: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub epoch_secs: u64,
    pub price: f64,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, epoch_secs: u64, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            epoch_secs,
            price,
        }
    }

    /// Index of the 60-second window this tick falls into.
    pub fn minute_index(&self) -> u64 {
        self.epoch_secs / SECONDS_PER_MINUTE
    }

    pub fn second_of_minute(&self) -> u64 {
        self.epoch_secs % SECONDS_PER_MINUTE
    }
}
