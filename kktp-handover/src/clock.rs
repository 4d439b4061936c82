//! Wall-clock helpers. `web_time` gives a `std::time`-compatible API backed
//! by JS `Date` on wasm32 and `std::time` natively.

pub(crate) fn timestamp_millis() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as u64
}
