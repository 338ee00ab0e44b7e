// vim: tw=80
//! Mock implementations of the collaborator traits.
//!
//! Each mock routes its trait methods through a [`callmock::Recorder`].
//! Expectations are declared with the mock's typed `expect_*` builders, or
//! with the raw recorder for responses the builders don't cover.  A raw
//! response's first slot may hold one of the function types defined here, in
//! which case the mock calls it with the original arguments.

mod batch_sender;
mod legacy_chain_container;

pub use batch_sender::{
    BatchCallContextExpectation,
    BatchCallFn,
    MockBatchSender
};
pub use legacy_chain_container::{
    ChainNodeConfigsExpectation,
    ConfigsFn,
    GetChainFn,
    GetErrFn,
    GetExpectation,
    GetFn,
    LenExpectation,
    LenFn,
    ListChainsFn,
    ListErrFn,
    ListExpectation,
    ListFn,
    MockLegacyChainContainer,
    SliceExpectation,
    SliceFn
};
