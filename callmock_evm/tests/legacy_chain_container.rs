// vim: tw=80
//! Behavior of `MockLegacyChainContainer`, through its trait.

use std::sync::Arc;

use callmock::*;
use callmock_evm::{mocks::*, *};
use static_assertions::assert_impl_all;

assert_impl_all!(MockLegacyChainContainer: Clone, Send, Sync);

fn chain(id: &str) -> Chain {
    Chain::new(id, id.len() as u64)
}

mod get {
    use super::*;

    #[test]
    fn by_id_then_wildcard_error() {
        let t = TestCase::new("get");
        let mock = MockLegacyChainContainer::new(&t);
        mock.expect_get().with("x").return_const(chain("x"));
        mock.expect_get().return_err(ChainError::NotFound("y".to_owned()));
        assert_eq!(Ok(chain("x")), mock.get("x"));
        assert_eq!(Err(ChainError::NotFound("y".to_owned())), mock.get("y"));
        assert!(t.finish().is_empty());
    }

    #[test]
    fn returning() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_get().returning(|id| {
            if id.starts_with("evm") {
                Ok(chain(id))
            } else {
                Err(ChainError::Disabled(id.to_owned()))
            }
        });
        assert_eq!(Ok(chain("evm-1")), mock.get("evm-1"));
        assert_eq!(Err(ChainError::Disabled("sol".to_owned())), mock.get("sol"));
    }

    #[test]
    fn returning_ok() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_get().returning_ok(chain).times(2);
        assert_eq!(Ok(chain("a")), mock.get("a"));
        assert_eq!(Ok(chain("bb")), mock.get("bb"));
        assert!(mock.assert_expectations());
    }

    #[test]
    fn withf() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_get()
            .withf(|id| id.len() == 2)
            .return_const(chain("ab"));
        assert_eq!(Ok(chain("ab")), mock.get("zz"));
    }

    /// Separate functions for the chain and the error.  The error wins when
    /// there is one.
    #[test]
    fn value_and_error_functions() {
        let mock = MockLegacyChainContainer::default();
        let value: GetChainFn = Arc::new(chain);
        let err: GetErrFn = Arc::new(|id: &str| {
            (id == "bad").then(|| ChainError::NotFound(id.to_owned()))
        });
        mock.recorder().expect("get").returns(values!(value, err));
        assert_eq!(Ok(chain("good")), mock.get("good"));
        assert_eq!(Err(ChainError::NotFound("bad".to_owned())), mock.get("bad"));
    }

    /// A missing error slot means no error.
    #[test]
    fn literal_without_error_slot() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder().expect("get").returns(values!(chain("x")));
        assert_eq!(Ok(chain("x")), mock.get("x"));
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::get(\"y\"): No matching expectation found")]
    fn unexpected_id() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_get().with("x").return_const(chain("x"));
        let _ = mock.get("y");
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::get: return value 0 is missing or Nil")]
    fn nil_chain_without_error() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder().expect("get").returns(values!(Nil, Nil));
        let _ = mock.get("x");
    }

    /// The chain slot is type checked even when the error slot wins.
    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::get: return value 0: ")]
    fn wrong_chain_type_with_error() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder()
            .expect("get")
            .returns(values!(5u32, ChainError::NotFound("x".to_owned())));
        let _ = mock.get("x");
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::get: return value 1: ")]
    fn wrong_error_type() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder()
            .expect("get")
            .returns(values!(chain("x"), "not found".to_owned()));
        let _ = mock.get("x");
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::get: return value 0 is missing")]
    fn no_response() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_get();
        let _ = mock.get("x");
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::get: return value 0")]
    fn wrong_return_type() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder().expect("get").returns(values!("x".to_owned()));
        let _ = mock.get("x");
    }

    #[test]
    fn unexpected_call_is_recorded_by_test_case() {
        let t = TestCase::new("unexpected");
        let mock = MockLegacyChainContainer::new(&t);
        let result = std::panic::catch_unwind(
            std::panic::AssertUnwindSafe(|| mock.get("x")));
        assert!(result.is_err());
        let failures = t.finish();
        assert_eq!(1, failures.len());
        assert!(failures[0].contains("No matching expectation found"));
    }
}

mod len {
    use super::*;

    #[test]
    fn unlimited() {
        let t = TestCase::new("len");
        let mock = MockLegacyChainContainer::new(&t);
        mock.expect_len().return_const(3);
        assert_eq!(3, mock.len());
        assert_eq!(3, mock.len());
        assert!(t.finish().is_empty());
    }

    #[test]
    fn returning() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_len().returning(|| 7).once();
        assert_eq!(7, mock.len());
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::len: return value 0: ")]
    fn wrong_integer_type() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder().expect("len").returns(values!(3i32));
        mock.len();
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::len: Expectation(..) called more than 1 time(s)")]
    fn too_many_calls() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_len().return_const(3).once();
        mock.len();
        mock.len();
    }

    #[test]
    fn unsatisfied_at_teardown() {
        let t = TestCase::new("len");
        let mock = MockLegacyChainContainer::new(&t);
        mock.expect_len().return_const(3).times(2);
        mock.len();
        assert_eq!(t.finish(), vec![
            "MockLegacyChainContainer::len: Expectation(..) called 1 time(s) \
            which is fewer than expected 2".to_owned()
        ]);
    }
}

mod list {
    use super::*;

    #[test]
    fn ids_are_flattened() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_list()
            .with(["a", "b"])
            .return_const(vec![chain("a"), chain("b")])
            .times(2);
        let owned = vec!["a".to_owned(), "b".to_owned()];
        let borrowed = owned.iter().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(Ok(vec![chain("a"), chain("b")]), mock.list(&["a", "b"]));
        assert_eq!(Ok(vec![chain("a"), chain("b")]), mock.list(&borrowed));
        assert!(mock.recorder().assert_called("list", ["a", "b"]));
        assert!(mock.assert_expectations());
    }

    #[test]
    #[should_panic(expected = "No matching expectation found")]
    fn arity_counts() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_list().with(["a"]).return_const(vec![chain("a")]);
        let _ = mock.list(&["a", "b"]);
    }

    #[test]
    fn no_ids() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_list()
            .with(Vec::<Matcher>::new())
            .return_const(vec![chain("a"), chain("b"), chain("c")]);
        assert_eq!(3, mock.list(&[]).map(|v| v.len()).unwrap_or_default());
    }

    #[test]
    fn nil_chains_with_error() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_list().return_err(ChainError::NotFound("z".to_owned()));
        assert_eq!(Err(ChainError::NotFound("z".to_owned())), mock.list(&["z"]));
    }

    /// A `Nil` list is an empty list.
    #[test]
    fn nil_chains_without_error() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder().expect("list").returns(values!(Nil, Nil));
        assert_eq!(Ok(vec![]), mock.list(&["a"]));
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::list: return value 0 is missing")]
    fn no_response() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_list();
        let _ = mock.list(&["a"]);
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::list: return value 0: ")]
    fn wrong_chains_type_with_error() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder()
            .expect("list")
            .returns(values!(chain("a"), ChainError::NotFound("a".to_owned())));
        let _ = mock.list(&["a"]);
    }

    #[test]
    fn returning() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_list()
            .returning(|ids| Ok(ids.iter().map(|id| chain(id)).collect()));
        assert_eq!(Ok(vec![chain("x"), chain("yy")]), mock.list(&["x", "yy"]));
    }

    #[test]
    fn returning_ok_with_error_function() {
        let mock = MockLegacyChainContainer::default();
        let chains: ListChainsFn =
            Arc::new(|ids: &[&str]| ids.iter().map(|id| chain(id)).collect());
        let err: ListErrFn = Arc::new(|ids: &[&str]| {
            ids.is_empty().then(|| ChainError::NotFound(String::new()))
        });
        mock.recorder().expect("list").returns(values!(chains, err));
        assert_eq!(Ok(vec![chain("q")]), mock.list(&["q"]));
        assert_eq!(Err(ChainError::NotFound(String::new())), mock.list(&[]));
    }
}

mod slice {
    use super::*;

    #[test]
    fn return_const() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_slice().return_const(vec![chain("a")]);
        assert_eq!(vec![chain("a")], mock.slice());
    }

    #[test]
    fn nil_is_empty() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder().expect("slice").returns(values!(Nil));
        assert!(mock.slice().is_empty());
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::slice: return value 0 is missing")]
    fn no_response() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_slice();
        mock.slice();
    }

    #[test]
    fn returning() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_slice().returning(|| vec![chain("b"), chain("c")]);
        assert_eq!(2, mock.slice().len());
    }
}

mod chain_node_configs {
    use super::*;

    fn configs() -> Configs {
        Configs::new(vec![NodeConfig {
            name: "primary".to_owned(),
            chain_id: 1,
            ws_url: Some("ws://localhost:8546".to_owned()),
            http_url: None,
        }])
    }

    #[test]
    fn return_const() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_chain_node_configs().return_const(configs());
        assert_eq!(configs(), mock.chain_node_configs());
    }

    #[test]
    fn nil_is_default() {
        let mock = MockLegacyChainContainer::default();
        mock.recorder().expect("chain_node_configs").returns(values!(Nil));
        assert!(mock.chain_node_configs().is_empty());
    }

    #[test]
    #[should_panic(expected = "MockLegacyChainContainer::chain_node_configs: return value 0 is missing")]
    fn no_response() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_chain_node_configs();
        mock.chain_node_configs();
    }

    #[test]
    fn returning() {
        let mock = MockLegacyChainContainer::default();
        mock.expect_chain_node_configs().returning(configs).never();
        assert!(mock.assert_expectations());
    }
}

/// Call order across methods of one mock.
#[test]
fn sequence() {
    let mut seq = Sequence::new();
    let mock = MockLegacyChainContainer::default();
    mock.expect_len().return_const(1).once().in_sequence(&mut seq);
    mock.expect_slice()
        .return_const(vec![chain("a")])
        .once()
        .in_sequence(&mut seq);
    assert_eq!(1, mock.len());
    assert_eq!(1, mock.slice().len());
}

#[test]
fn checkpoint() {
    let mock = MockLegacyChainContainer::default();
    mock.expect_len().return_const(1);
    mock.len();
    assert!(mock.checkpoint());
    mock.expect_len().return_const(2);
    assert_eq!(2, mock.len());
}

/// A substitute that calls back into its own mock holds it weakly, so
/// dropping the mock frees it.
#[test]
fn returning_through_weak_handle() {
    let mock = Arc::new(MockLegacyChainContainer::default());
    let weak = Arc::downgrade(&mock);
    mock.expect_len().return_const(2);
    mock.expect_slice().returning(move || {
        let n = weak.upgrade().map_or(0, |m| m.len());
        (0..n).map(|i| chain(&i.to_string())).collect()
    });
    assert_eq!(vec![chain("0"), chain("1")], mock.slice());
    let weak = Arc::downgrade(&mock);
    drop(mock);
    assert!(weak.upgrade().is_none());
}

/// Shared with a worker thread through the trait object.
#[test]
fn as_trait_object() {
    let t = TestCase::new("shared");
    let mock = MockLegacyChainContainer::new(&t);
    mock.expect_len().return_const(4).times(2);
    let shared: Arc<dyn LegacyChainContainer> = Arc::new(mock.clone());
    let worker = {
        let shared = shared.clone();
        std::thread::spawn(move || shared.len())
    };
    assert_eq!(4, worker.join().unwrap());
    assert_eq!(4, shared.len());
    assert!(t.finish().is_empty());
}
