//! Scoped timing for diagnostics

use std::time::Instant;

use tracing::debug;

/// Run `f`, logging how long it took at debug level
pub fn measure<T>(name: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    debug!("{} in {:.3}ms", name, ms);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_returns_closure_value() {
        assert_eq!(measure("add", || 2 + 2), 4);
        let res: Result<u8, &str> = measure("fail", || Err("boom"));
        assert_eq!(res, Err("boom"));
    }
}
