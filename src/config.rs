// src/config.rs
//
// Environment-driven defaults for the loader.  A `.env` file is honored
// once, the first time any knob is read.

use once_cell::sync::Lazy;

pub const DEFAULT_BATCH_SIZE: usize = 32;

static ENV_INIT: Lazy<()> = Lazy::new(|| {
    dotenvy::dotenv().ok();
});

fn env_usize(name: &str) -> Option<usize> {
    Lazy::force(&ENV_INIT);
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("ignoring {name}={raw}: not a valid count");
            None
        }
    }
}

/// `ADLIO_BATCH_SIZE`, falling back to [`DEFAULT_BATCH_SIZE`].
pub fn default_batch_size() -> usize {
    env_usize("ADLIO_BATCH_SIZE").unwrap_or(DEFAULT_BATCH_SIZE)
}

/// `ADLIO_NUM_WORKERS`; 0 (auto) when unset.
pub fn default_num_workers() -> usize {
    env_usize("ADLIO_NUM_WORKERS").unwrap_or(0)
}

/// `ADLIO_PREFETCH`; 0 (disabled) when unset.
pub fn default_prefetch() -> usize {
    env_usize("ADLIO_PREFETCH").unwrap_or(0)
}
