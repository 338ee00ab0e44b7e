// vim: tw=80
use std::sync::Arc;

use callmock::{
    args,
    expectation_common,
    matched_by,
    values,
    Arguments,
    ExpectationGuard,
    Matcher,
    Nil,
    Recorder,
    TestScope
};

use crate::{Chain, ChainError, Configs, LegacyChainContainer};

/// Replaces the whole of [`LegacyChainContainer::get`].
pub type GetFn = Arc<dyn Fn(&str) -> Result<Chain, ChainError> + Send + Sync>;
/// Computes only the chain returned by `get`.
pub type GetChainFn = Arc<dyn Fn(&str) -> Chain + Send + Sync>;
/// Computes only the error returned by `get`.  `None` means no error.
pub type GetErrFn = Arc<dyn Fn(&str) -> Option<ChainError> + Send + Sync>;
/// Replaces the whole of [`LegacyChainContainer::list`].
pub type ListFn =
    Arc<dyn Fn(&[&str]) -> Result<Vec<Chain>, ChainError> + Send + Sync>;
/// Computes only the chains returned by `list`.
pub type ListChainsFn = Arc<dyn Fn(&[&str]) -> Vec<Chain> + Send + Sync>;
/// Computes only the error returned by `list`.  `None` means no error.
pub type ListErrFn =
    Arc<dyn Fn(&[&str]) -> Option<ChainError> + Send + Sync>;
pub type LenFn = Arc<dyn Fn() -> usize + Send + Sync>;
pub type SliceFn = Arc<dyn Fn() -> Vec<Chain> + Send + Sync>;
pub type ConfigsFn = Arc<dyn Fn() -> Configs + Send + Sync>;

/// Mock of [`LegacyChainContainer`].
///
/// Clones share their expectations and call log.
///
/// # Examples
///
/// A wildcard expectation may answer with an error only.
/// ```
/// # use callmock_evm::*;
/// let chains = MockLegacyChainContainer::default();
/// chains.expect_get().with("x").return_const(Chain::new("x", 1));
/// chains.expect_get().return_err(ChainError::NotFound("y".into()));
/// assert_eq!(Ok(Chain::new("x", 1)), chains.get("x"));
/// assert_eq!(Err(ChainError::NotFound("y".into())), chains.get("y"));
/// assert!(chains.assert_expectations());
/// ```
#[derive(Clone, Debug)]
pub struct MockLegacyChainContainer {
    recorder: Arc<Recorder>,
}

impl MockLegacyChainContainer {
    const NAME: &'static str = "MockLegacyChainContainer";

    /// Build a mock bound to `scope`, which verifies its expectations at
    /// teardown.
    pub fn new<S: TestScope + ?Sized>(scope: &S) -> Self {
        MockLegacyChainContainer{recorder: Recorder::scoped(Self::NAME, scope)}
    }

    pub fn assert_expectations(&self) -> bool {
        self.recorder.assert_expectations()
    }

    /// Verify and discard all current expectations.
    pub fn checkpoint(&self) -> bool {
        self.recorder.checkpoint()
    }

    pub fn expect_chain_node_configs(&self) -> ChainNodeConfigsExpectation<'_> {
        ChainNodeConfigsExpectation(self.recorder.expect("chain_node_configs"))
    }

    pub fn expect_get(&self) -> GetExpectation<'_> {
        GetExpectation(self.recorder.expect("get"))
    }

    pub fn expect_len(&self) -> LenExpectation<'_> {
        LenExpectation(self.recorder.expect("len"))
    }

    pub fn expect_list(&self) -> ListExpectation<'_> {
        ListExpectation(self.recorder.expect("list"))
    }

    pub fn expect_slice(&self) -> SliceExpectation<'_> {
        SliceExpectation(self.recorder.expect("slice"))
    }

    /// The underlying recorder, for raw expectations and call log queries.
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }
}

impl Default for MockLegacyChainContainer {
    fn default() -> Self {
        MockLegacyChainContainer{recorder: Arc::new(Recorder::new(Self::NAME))}
    }
}

impl LegacyChainContainer for MockLegacyChainContainer {
    fn chain_node_configs(&self) -> Configs {
        let ret = self.recorder.invoke("chain_node_configs", args!());
        match ret.func::<ConfigsFn>(0) {
            Some(f) => f(),
            None => ret.optional::<Configs>(0).unwrap_or_default()
        }
    }

    fn get(&self, id: &str) -> Result<Chain, ChainError> {
        let ret = self.recorder.invoke("get", args!(id.to_owned()));
        if let Some(f) = ret.func::<GetFn>(0) {
            return f(id);
        }
        let chain = match ret.func::<GetChainFn>(0) {
            Some(f) => Some(f(id)),
            None => ret.optional::<Chain>(0)
        };
        let err = match ret.func::<GetErrFn>(1) {
            Some(f) => f(id),
            None => ret.error::<ChainError>(1)
        };
        match (chain, err) {
            (_, Some(e)) => Err(e),
            (Some(chain), None) => Ok(chain),
            // A Nil chain is only acceptable alongside an error
            (None, None) => Ok(ret.get::<Chain>(0))
        }
    }

    fn len(&self) -> usize {
        let ret = self.recorder.invoke("len", args!());
        match ret.func::<LenFn>(0) {
            Some(f) => f(),
            None => ret.get::<usize>(0)
        }
    }

    fn list(&self, ids: &[&str]) -> Result<Vec<Chain>, ChainError> {
        let args = Arguments::new().extend(ids.iter().map(|id| id.to_string()));
        let ret = self.recorder.invoke("list", args);
        if let Some(f) = ret.func::<ListFn>(0) {
            return f(ids);
        }
        let chains = match ret.func::<ListChainsFn>(0) {
            Some(f) => f(ids),
            None => ret.optional::<Vec<Chain>>(0).unwrap_or_default()
        };
        let err = match ret.func::<ListErrFn>(1) {
            Some(f) => f(ids),
            None => ret.error::<ChainError>(1)
        };
        match err {
            Some(e) => Err(e),
            None => Ok(chains)
        }
    }

    fn slice(&self) -> Vec<Chain> {
        let ret = self.recorder.invoke("slice", args!());
        match ret.func::<SliceFn>(0) {
            Some(f) => f(),
            None => ret.optional::<Vec<Chain>>(0).unwrap_or_default()
        }
    }
}

/// Expectation builder for [`LegacyChainContainer::chain_node_configs`]
pub struct ChainNodeConfigsExpectation<'a>(ExpectationGuard<'a>);

impl ChainNodeConfigsExpectation<'_> {
    pub fn return_const(&mut self, configs: Configs) -> &mut Self {
        self.0.returns(values!(configs));
        self
    }

    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: Fn() -> Configs + Send + Sync + 'static
    {
        let f: ConfigsFn = Arc::new(f);
        self.0.returns(values!(f));
        self
    }

    expectation_common!{}
}

/// Expectation builder for [`LegacyChainContainer::get`]
pub struct GetExpectation<'a>(ExpectationGuard<'a>);

impl GetExpectation<'_> {
    pub fn return_const(&mut self, chain: Chain) -> &mut Self {
        self.0.returns(values!(chain, Nil));
        self
    }

    pub fn return_err(&mut self, err: ChainError) -> &mut Self {
        self.0.returns(values!(Nil, err));
        self
    }

    /// Compute the whole result from the id.
    ///
    /// The mock owns `f`, so a closure that captures a clone of this same
    /// mock forms a reference cycle and is never freed.  Capture a
    /// [`Weak`](std::sync::Weak) instead.
    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&str) -> Result<Chain, ChainError> + Send + Sync + 'static
    {
        let f: GetFn = Arc::new(f);
        self.0.returns(values!(f));
        self
    }

    /// Compute the chain from the id.  The call never fails.
    pub fn returning_ok<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&str) -> Chain + Send + Sync + 'static
    {
        let f: GetChainFn = Arc::new(f);
        self.0.returns(values!(f, Nil));
        self
    }

    /// Only match calls whose id is accepted by `id`.  A string converts to
    /// an exact match.
    pub fn with<M: Into<Matcher>>(&mut self, id: M) -> &mut Self {
        self.0.with([id.into()]);
        self
    }

    pub fn withf<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&str) -> bool + Send + 'static
    {
        self.0.with([matched_by(move |id: &String| f(id.as_str()))]);
        self
    }

    expectation_common!{}
}

/// Expectation builder for [`LegacyChainContainer::len`]
pub struct LenExpectation<'a>(ExpectationGuard<'a>);

impl LenExpectation<'_> {
    pub fn return_const(&mut self, len: usize) -> &mut Self {
        self.0.returns(values!(len));
        self
    }

    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: Fn() -> usize + Send + Sync + 'static
    {
        let f: LenFn = Arc::new(f);
        self.0.returns(values!(f));
        self
    }

    expectation_common!{}
}

/// Expectation builder for [`LegacyChainContainer::list`]
///
/// Each requested id is its own positional argument, so `with` takes one
/// matcher per id.
pub struct ListExpectation<'a>(ExpectationGuard<'a>);

impl ListExpectation<'_> {
    pub fn return_const(&mut self, chains: Vec<Chain>) -> &mut Self {
        self.0.returns(values!(chains, Nil));
        self
    }

    pub fn return_err(&mut self, err: ChainError) -> &mut Self {
        self.0.returns(values!(Nil, err));
        self
    }

    /// Compute the whole result from the ids.
    ///
    /// The mock owns `f`, so a closure that captures a clone of this same
    /// mock forms a reference cycle and is never freed.  Capture a
    /// [`Weak`](std::sync::Weak) instead.
    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&[&str]) -> Result<Vec<Chain>, ChainError>
                 + Send + Sync + 'static
    {
        let f: ListFn = Arc::new(f);
        self.0.returns(values!(f));
        self
    }

    /// Compute the chains from the ids.  The call never fails.
    pub fn returning_ok<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&[&str]) -> Vec<Chain> + Send + Sync + 'static
    {
        let f: ListChainsFn = Arc::new(f);
        self.0.returns(values!(f, Nil));
        self
    }

    pub fn with<I, M>(&mut self, ids: I) -> &mut Self
        where I: IntoIterator<Item = M>, M: Into<Matcher>
    {
        self.0.with(ids);
        self
    }

    expectation_common!{}
}

/// Expectation builder for [`LegacyChainContainer::slice`]
pub struct SliceExpectation<'a>(ExpectationGuard<'a>);

impl SliceExpectation<'_> {
    pub fn return_const(&mut self, chains: Vec<Chain>) -> &mut Self {
        self.0.returns(values!(chains));
        self
    }

    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: Fn() -> Vec<Chain> + Send + Sync + 'static
    {
        let f: SliceFn = Arc::new(f);
        self.0.returns(values!(f));
        self
    }

    expectation_common!{}
}
