use std::{cell::RefCell, ffi::OsStr};

use crate::ErrorPolicy;

#[derive(Clone, Copy, Debug)]
struct Env {
    strict: bool,
    max_steps: Option<u64>,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Read `SML_STRICT` and `SML_MAX_STEPS`. Must be called once, before any other function here.
pub fn init() {
    let value = Env {
        strict: var_is("SML_STRICT", "1"),
        max_steps: std::env::var("SML_MAX_STEPS")
            .ok()
            .and_then(|v| v.trim().parse().ok()),
    };
    set_env(value);
}

/// Translation policy requested by the environment.
pub fn error_policy() -> ErrorPolicy {
    if with_env(|env| env.strict) {
        ErrorPolicy::Abort
    } else {
        ErrorPolicy::Continue
    }
}

/// Step limit requested by the environment.
pub fn max_steps() -> Option<u64> {
    with_env(|env| env.max_steps)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
