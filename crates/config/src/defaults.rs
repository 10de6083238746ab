//! Serde default values for the configuration schema

pub fn default_bar_width_secs() -> i64 {
    60
}

pub fn default_queue_capacity() -> usize {
    1024
}

pub fn default_start_price() -> f64 {
    100.0
}

pub fn default_tick_count() -> u32 {
    240
}
