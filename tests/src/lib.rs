//! Scenario and property tests exercising the public surface of `grove`
//! across module boundaries, including the `internal-api` introspection.

#[cfg(test)]
mod model;
#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod set_laws;

#[cfg(test)]
fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}
