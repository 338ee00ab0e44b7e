// vim: tw=80
//! Behavior of `MockBatchSender`, through its trait.

use std::sync::Arc;

use callmock::*;
use callmock_evm::{mocks::*, *};
use serde_json::json;
use static_assertions::assert_impl_all;

assert_impl_all!(MockBatchSender: Clone, Send, Sync);

const LIMIT: usize = 10;

fn batch(n: usize) -> Vec<BatchElem> {
    (0..n).map(|i| BatchElem::new("eth_getBlockByNumber",
                                  vec![json!(format!("{i:#x}")), json!(false)]))
        .collect()
}

/// Accepts batches up to a size limit, answering every element.
fn limited(_ctx: &Context, b: &mut [BatchElem]) -> RpcResult<()> {
    if b.len() > LIMIT {
        return Err(RpcError::BatchTooLarge{len: b.len(), limit: LIMIT});
    }
    for elem in b.iter_mut() {
        elem.result = Some(json!({"number": elem.args[0]}));
    }
    Ok(())
}

#[test]
fn size_limit() {
    let t = TestCase::new("size_limit");
    let mock = MockBatchSender::new(&t);
    mock.expect_batch_call_context().returning(limited).times(2);

    let ctx = Context::background();
    let mut small = batch(LIMIT);
    assert_eq!(Ok(()), mock.batch_call_context(&ctx, &mut small));
    assert!(small.iter().all(|e| e.result.is_some()));

    let mut large = batch(LIMIT + 1);
    assert_eq!(Err(RpcError::BatchTooLarge{len: 11, limit: 10}),
        mock.batch_call_context(&ctx, &mut large));
    assert!(large.iter().all(|e| e.result.is_none()));
    assert!(t.finish().is_empty());
}

#[test]
fn return_ok() {
    let mock = MockBatchSender::default();
    mock.expect_batch_call_context().return_ok().once();
    let mut b = batch(2);
    assert_eq!(Ok(()), mock.batch_call_context(&Context::background(), &mut b));
    assert!(b[0].result.is_none());
    assert!(mock.assert_expectations());
}

/// An expectation without any response is a setup defect, not a success.
#[test]
#[should_panic(expected = "MockBatchSender::batch_call_context: return value 0 is missing")]
fn no_response() {
    let mock = MockBatchSender::default();
    mock.expect_batch_call_context();
    let _ = mock.batch_call_context(&Context::background(), &mut []);
}

#[test]
fn return_err() {
    let mock = MockBatchSender::default();
    mock.expect_batch_call_context()
        .return_err(RpcError::Transport("connection reset".to_owned()));
    let r = mock.batch_call_context(&Context::background(), &mut batch(1));
    assert_eq!("transport error: connection reset",
        r.unwrap_err().to_string());
}

#[test]
fn withf() {
    let mock = MockBatchSender::default();
    mock.expect_batch_call_context()
        .withf(|b| b.len() <= LIMIT)
        .return_ok();
    mock.expect_batch_call_context()
        .return_err(RpcError::BatchTooLarge{len: 0, limit: LIMIT});
    let ctx = Context::background();
    assert!(mock.batch_call_context(&ctx, &mut batch(3)).is_ok());
    assert!(mock.batch_call_context(&ctx, &mut batch(30)).is_err());
    assert!(mock.assert_expectations());
}

/// The substitute sees the caller's context.
#[test]
fn cancelled_context() {
    let mock = MockBatchSender::default();
    mock.expect_batch_call_context().returning(|ctx, _b| {
        if ctx.is_cancelled() {
            Err(RpcError::Cancelled)
        } else {
            Ok(())
        }
    });
    let ctx = Context::background();
    assert_eq!(Ok(()), mock.batch_call_context(&ctx, &mut batch(1)));
    ctx.cancel();
    assert_eq!(Err(RpcError::Cancelled),
        mock.batch_call_context(&ctx, &mut batch(1)));
}

#[test]
fn recorded_batch() {
    let mock = MockBatchSender::default();
    mock.expect_batch_call_context().returning(limited);
    mock.batch_call_context(&Context::background(), &mut batch(2)).unwrap();
    let calls = mock.recorder().calls_to("batch_call_context");
    assert_eq!(1, calls.len());
    let recorded = calls[0].args().downcast::<Vec<BatchElem>>(1).unwrap();
    assert_eq!(batch(2), *recorded);
}

#[test]
#[should_panic(expected = "MockBatchSender::batch_call_context: return value 0: ")]
fn wrong_error_type() {
    let mock = MockBatchSender::default();
    mock.recorder()
        .expect("batch_call_context")
        .returns(values!(ChainError::NotFound("x".to_owned())));
    let _ = mock.batch_call_context(&Context::background(), &mut batch(1));
}

#[test]
#[should_panic(expected = "No matching expectation found")]
fn unexpected_call() {
    let mock = MockBatchSender::default();
    let _ = mock.batch_call_context(&Context::background(), &mut batch(1));
}

/// Raw substitute functions work the same as typed ones.
#[test]
fn raw_function() {
    let mock = MockBatchSender::default();
    let f: BatchCallFn = Arc::new(limited);
    mock.recorder().expect("batch_call_context").returns(values!(f));
    assert!(mock.batch_call_context(&Context::background(), &mut batch(LIMIT + 1))
        .is_err());
}

/// One batch per worker thread.
#[test]
fn concurrent_batches() {
    let t = TestCase::new("concurrent");
    let mock = MockBatchSender::new(&t);
    mock.expect_batch_call_context().returning(limited).times(4);
    let handles = (0..4).map(|_| {
        let sender: Arc<dyn BatchSender> = Arc::new(mock.clone());
        std::thread::spawn(move || {
            let mut b = batch(5);
            sender.batch_call_context(&Context::background(), &mut b)
        })
    }).collect::<Vec<_>>();
    for h in handles {
        assert_eq!(Ok(()), h.join().unwrap());
    }
    assert!(t.finish().is_empty());
}
