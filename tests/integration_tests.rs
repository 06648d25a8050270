//! Entry point for the `tests/integration/` module tree.

mod integration;
