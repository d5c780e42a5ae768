//! Property-based tests for justification search using proptest.
//!
//! Knowledge bases are drawn from a small pool of formulas over three atoms,
//! small enough that every subset can be checked by brute force. The tests
//! check that the search:
//!
//! - returns only sound and minimal justifications, without duplicates
//! - finds every justification when unlimited
//! - respects the limit
//! - is deterministic
