//! Workflows for the VoteChain CLI
pub mod keys;
pub mod pages;
