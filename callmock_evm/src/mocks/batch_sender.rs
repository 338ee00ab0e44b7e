// vim: tw=80
use std::sync::Arc;

use callmock::{
    args,
    expectation_common,
    matched_by,
    of_type,
    values,
    ExpectationGuard,
    Matcher,
    Nil,
    Recorder,
    TestScope
};

use crate::{BatchElem, BatchSender, Context, RpcError, RpcResult};

/// Replaces the whole of [`BatchSender::batch_call_context`].  It may fill in
/// the batch's results.
pub type BatchCallFn =
    Arc<dyn Fn(&Context, &mut [BatchElem]) -> RpcResult<()> + Send + Sync>;

/// Mock of [`BatchSender`].
///
/// The batch is recorded as an owned `Vec<BatchElem>`, so argument matchers
/// see a snapshot taken before any substitute function ran.
///
/// # Examples
/// ```
/// # use callmock_evm::*;
/// let sender = MockBatchSender::default();
/// sender.expect_batch_call_context()
///     .returning(|_ctx, batch| {
///         for elem in batch.iter_mut() {
///             elem.result = Some(serde_json::json!("0x1"));
///         }
///         Ok(())
///     });
/// let mut batch = vec![BatchElem::new("eth_chainId", vec![])];
/// sender.batch_call_context(&Context::background(), &mut batch).unwrap();
/// assert_eq!(Some(serde_json::json!("0x1")), batch[0].result);
/// ```
#[derive(Clone, Debug)]
pub struct MockBatchSender {
    recorder: Arc<Recorder>,
}

impl MockBatchSender {
    const NAME: &'static str = "MockBatchSender";

    /// Build a mock bound to `scope`, which verifies its expectations at
    /// teardown.
    pub fn new<S: TestScope + ?Sized>(scope: &S) -> Self {
        MockBatchSender{recorder: Recorder::scoped(Self::NAME, scope)}
    }

    pub fn assert_expectations(&self) -> bool {
        self.recorder.assert_expectations()
    }

    /// Verify and discard all current expectations.
    pub fn checkpoint(&self) -> bool {
        self.recorder.checkpoint()
    }

    pub fn expect_batch_call_context(&self) -> BatchCallContextExpectation<'_> {
        BatchCallContextExpectation(self.recorder.expect("batch_call_context"))
    }

    /// The underlying recorder, for raw expectations and call log queries.
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }
}

impl Default for MockBatchSender {
    fn default() -> Self {
        MockBatchSender{recorder: Arc::new(Recorder::new(Self::NAME))}
    }
}

impl BatchSender for MockBatchSender {
    fn batch_call_context(&self, ctx: &Context, b: &mut [BatchElem])
        -> RpcResult<()>
    {
        let ret = self.recorder.invoke("batch_call_context",
            args!(ctx.clone(), b.to_vec()));
        match ret.func::<BatchCallFn>(0) {
            Some(f) => f(ctx, b),
            None => match ret.optional::<RpcError>(0) {
                Some(e) => Err(e),
                None => Ok(())
            }
        }
    }
}

/// Expectation builder for [`BatchSender::batch_call_context`]
pub struct BatchCallContextExpectation<'a>(ExpectationGuard<'a>);

impl BatchCallContextExpectation<'_> {
    pub fn return_err(&mut self, err: RpcError) -> &mut Self {
        self.0.returns(values!(err));
        self
    }

    /// Succeed without touching the batch.
    pub fn return_ok(&mut self) -> &mut Self {
        self.0.returns(values!(Nil));
        self
    }

    /// Handle the batch with `f`, which may fill in each element's result.
    ///
    /// The mock owns `f`, so a closure that captures a clone of this same
    /// mock forms a reference cycle and is never freed.  Capture a
    /// [`Weak`](std::sync::Weak) instead.
    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&Context, &mut [BatchElem]) -> RpcResult<()>
                 + Send + Sync + 'static
    {
        let f: BatchCallFn = Arc::new(f);
        self.0.returns(values!(f));
        self
    }

    /// Match the context and the batch.  The batch is matched as a
    /// `Vec<BatchElem>`.
    pub fn with<C, B>(&mut self, ctx: C, batch: B) -> &mut Self
        where C: Into<Matcher>, B: Into<Matcher>
    {
        self.0.with([ctx.into(), batch.into()]);
        self
    }

    /// Match any context, and a batch accepted by `f`.
    pub fn withf<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&[BatchElem]) -> bool + Send + 'static
    {
        self.0.with([
            of_type::<Context>(),
            matched_by(move |b: &Vec<BatchElem>| f(b.as_slice()))
        ]);
        self
    }

    expectation_common!{}
}
