use crate::runtime::{callable::Callable, environment::Environment, value::Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Defines the host-provided functions in the global scope.
pub fn install(globals: &Environment) {
    globals.define("clock", Value::Callable(Callable::native("clock", 0, clock)));
}

fn clock(_args: &[Value]) -> Value {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default();
    Value::Number(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_a_zero_arity_native() {
        let globals = Environment::new();
        install(&globals);
        let Ok(Value::Callable(callable)) = globals.get("clock") else {
            panic!("clock is not defined");
        };
        assert_eq!(callable.arity(), 0);
        assert_eq!(callable.to_string(), "<native fn clock>");
    }

    #[test]
    fn clock_reports_seconds_since_the_epoch() {
        let Value::Number(seconds) = clock(&[]) else {
            panic!("clock returned a non-number");
        };
        assert!(seconds > 1_000_000_000.0);
    }
}
