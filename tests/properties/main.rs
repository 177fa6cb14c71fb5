mod determinism_tests;
mod invariant_tests;
