// Intentionally empty: this package exists to provide the `echo-plugin`
// binary as a test fixture for `packplug-runner`/`packplug-session`
// integration tests. Cargo only tracks `CARGO_BIN_EXE_echo-plugin` for
// dependency packages that also expose a library target.
