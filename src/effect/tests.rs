use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::error::Error;
use crate::io::IO;
use crate::optics::Lens;
use crate::reader::Reader;
use crate::reader_io::ReaderIO;
use crate::retry::{RetryPolicy, RetryStatus};
use crate::testing::{cancelled_context, CallCounter, Recorder};

#[derive(Clone, Debug, PartialEq)]
struct Env {
    name: String,
    factor: i32,
}

fn env() -> Env {
    Env {
        name: "svc".into(),
        factor: 3,
    }
}

fn bg() -> Context {
    Context::background()
}

fn counted(counter: &CallCounter) -> ReaderReaderIOResult<Env, usize> {
    let counter = counter.clone();
    from_io(IO::from_fn(move || counter.hit()))
}

#[tokio::test]
async fn test_of_and_left() {
    assert_eq!(of::<Env, _>(1).run(env(), bg()).await, Ok(1));
    assert_eq!(
        left::<Env, i32>(Error::msg("e")).run(env(), bg()).await,
        Err(Error::msg("e"))
    );
}

#[tokio::test]
async fn test_ask_and_asks_read_outer_environment() {
    assert_eq!(ask::<Env>().run(env(), bg()).await, Ok(env()));
    assert_eq!(
        asks(|e: Env| e.name).run(env(), bg()).await,
        Ok("svc".to_string())
    );
}

#[tokio::test]
async fn test_read_supplies_environment_first() {
    let rrior = asks(|e: Env| e.factor * 2);
    let narrowed = rrior.read(env());
    assert_eq!(narrowed.run(bg()).run().await, Ok(6));
    assert_eq!(narrowed.execute(bg()).await, Ok(6));
}

#[tokio::test]
async fn test_building_runs_nothing() {
    let counter = CallCounter::new();
    let rrior = counted(&counter).map(|n| n + 1).chain(|n| of(n * 2));

    assert_eq!(counter.count(), 0);
    let _pending = rrior.run(env(), bg());
    assert_eq!(counter.count(), 0);

    assert_eq!(rrior.run(env(), bg()).await, Ok(2));
    assert_eq!(rrior.run(env(), bg()).await, Ok(4));
    assert_eq!(counter.count(), 2);
}

#[tokio::test]
async fn test_effectful_leaf_refuses_cancelled_context() {
    let counter = CallCounter::new();
    let result = counted(&counter).run(env(), cancelled_context()).await;

    crate::assert_cancelled!(result);
    assert_eq!(counter.count(), 0);
}

#[tokio::test]
async fn test_from_async_does_not_call_closure_on_cancelled_context() {
    let calls = CallCounter::new();
    let leaf = from_async({
        let calls = calls.clone();
        move |_: Env, _: Context| {
            calls.hit();
            async { Ok(()) }
        }
    });

    crate::assert_cancelled!(leaf.run(env(), cancelled_context()).await);
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn test_pure_leaf_ignores_cancelled_context() {
    assert_eq!(of::<Env, _>(5).run(env(), cancelled_context()).await, Ok(5));
}

#[tokio::test]
async fn test_chain_stops_on_cancelled_context() {
    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();
    let rrior = of::<Env, _>(1).chain(move |n| {
        flag.store(true, Ordering::SeqCst);
        of(n + 1)
    });

    crate::assert_cancelled!(rrior.run(env(), cancelled_context()).await);
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_chain_short_circuits_on_error() {
    let counter = CallCounter::new();
    let rrior = left::<Env, usize>(Error::msg("first")).chain({
        let counter = counter.clone();
        move |_| counted(&counter)
    });

    assert_eq!(rrior.run(env(), bg()).await, Err(Error::msg("first")));
    assert_eq!(counter.count(), 0);
}

#[tokio::test]
async fn test_chain_first_and_tap_keep_value() {
    let seen = Recorder::new();
    let rrior = of::<Env, _>(7)
        .chain_first({
            let seen = seen.clone();
            move |n| {
                let seen = seen.clone();
                let n = *n;
                from_io(IO::from_fn(move || seen.push(n)))
            }
        })
        .tap({
            let seen = seen.clone();
            move |n| seen.push(n * 10)
        });

    assert_eq!(rrior.run(env(), bg()).await, Ok(7));
    assert_eq!(seen.entries(), vec![7, 70]);
}

#[tokio::test]
async fn test_chain_first_failure_fails_whole() {
    let rrior = of::<Env, _>(1).chain_first(|_| left::<Env, ()>(Error::msg("side")));
    assert_eq!(rrior.run(env(), bg()).await, Err(Error::msg("side")));
}

#[tokio::test]
async fn test_map_left_bimap_and_map_to() {
    let failed = left::<Env, i32>(Error::msg("e")).bimap(|e| e.context("outer"), |n| n + 1);
    let err = failed.run(env(), bg()).await.unwrap_err();
    assert_eq!(err.context_trail(), ["outer".to_string()]);

    let replaced = of::<Env, _>(1).map_to("done");
    assert_eq!(replaced.run(env(), bg()).await, Ok("done"));
}

#[tokio::test]
async fn test_alt_is_lazy() {
    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();
    let rrior = of::<Env, _>(42).alt(move || {
        flag.store(true, Ordering::SeqCst);
        of(0)
    });

    assert_eq!(rrior.run(env(), bg()).await, Ok(42));
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_alt_uses_second_on_failure() {
    let rrior = left::<Env, i32>(Error::msg("down")).alt(|| asks(|e: Env| e.factor));
    assert_eq!(rrior.run(env(), bg()).await, Ok(3));
}

#[tokio::test]
async fn test_chain_left_sees_error() {
    let rrior = left::<Env, String>(Error::msg("404"))
        .chain_left(|e| of(format!("recovered from {}", e.root_message())));
    assert_eq!(
        rrior.run(env(), bg()).await,
        Ok("recovered from 404".to_string())
    );
}

#[tokio::test]
async fn test_alt_does_not_recover_cancellation() {
    let fallbacks = CallCounter::new();
    let rrior = from_async(|_: Env, _: Context| async { Ok(1) }).alt({
        let fallbacks = fallbacks.clone();
        move || {
            fallbacks.hit();
            of(0)
        }
    });

    crate::assert_cancelled!(rrior.run(env(), cancelled_context()).await);
    assert_eq!(fallbacks.count(), 0);
}

#[tokio::test]
async fn test_chain_left_passes_cancellation_through() {
    let handlers = CallCounter::new();
    let rrior = left::<Env, i32>(Error::deadline_exceeded()).chain_left({
        let handlers = handlers.clone();
        move |_| {
            handlers.hit();
            of(0)
        }
    });

    assert_eq!(
        rrior.run(env(), bg()).await,
        Err(Error::deadline_exceeded())
    );
    assert_eq!(handlers.count(), 0);
}

#[tokio::test]
async fn test_chain_left_on_done_context_reports_cancellation() {
    let handlers = CallCounter::new();
    let rrior = left::<Env, i32>(Error::msg("down")).chain_left({
        let handlers = handlers.clone();
        move |_| {
            handlers.hit();
            of(0)
        }
    });

    crate::assert_cancelled!(rrior.run(env(), cancelled_context()).await);
    assert_eq!(handlers.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_inside_alt_is_not_swallowed() {
    let slow = from_async(|_: Env, _: Context| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(1)
    });
    let rrior = slow
        .with_timeout(Duration::from_secs(1))
        .alt(|| of(0));

    assert_eq!(
        rrior.run(env(), bg()).await,
        Err(Error::deadline_exceeded())
    );
}

#[tokio::test]
async fn test_get_or_else_never_fails() {
    let fallback = left::<Env, i32>(Error::msg("e")).get_or_else(|_| -1);
    assert_eq!(fallback.run(env()).run(bg()).run().await, -1);

    let value = of::<Env, _>(9).get_or_else(|_| -1);
    assert_eq!(value.run(env()).run(bg()).run().await, 9);
}

#[tokio::test]
async fn test_ap_applies_function() {
    let add = of::<Env, _>(|n: i32| n + 1);
    assert_eq!(add.ap(asks(|e: Env| e.factor)).run(env(), bg()).await, Ok(4));
}

#[tokio::test]
async fn test_ap_reports_function_error_when_both_fail() {
    let f = left::<Env, fn(i32) -> i32>(Error::msg("function side"));
    let x = left::<Env, i32>(Error::msg("value side"));
    assert_eq!(
        f.ap(x).run(env(), bg()).await,
        Err(Error::msg("function side"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_ap_runs_sides_concurrently() {
    let slow = |value: i32| {
        from_async(move |_: Env, _: Context| async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(value)
        })
    };
    let pair = slow(1).map(|a| move |b: i32| a + b).ap(slow(2));

    let start = tokio::time::Instant::now();
    assert_eq!(pair.run(env(), bg()).await, Ok(3));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_ap_seq_skips_value_side_after_failure() {
    let counter = CallCounter::new();
    let f = left::<Env, fn(usize) -> usize>(Error::msg("no"));
    let result = f.ap_seq(counted(&counter)).run(env(), bg()).await;

    assert_eq!(result, Err(Error::msg("no")));
    assert_eq!(counter.count(), 0);
}

#[tokio::test]
async fn test_zip_and_flatten() {
    let zipped = of::<Env, _>(1).zip(asks(|e: Env| e.name));
    assert_eq!(zipped.run(env(), bg()).await, Ok((1, "svc".to_string())));

    let nested = of::<Env, _>(()).map(|_| asks(|e: Env| e.factor));
    assert_eq!(nested.flatten().run(env(), bg()).await, Ok(3));
}

#[tokio::test]
async fn test_chain_k_family() {
    let parsed = of::<Env, _>("12").chain_result_k(|s| s.parse::<i32>().map_err(Error::new));
    assert_eq!(parsed.clone().run(env(), bg()).await, Ok(12));

    let io = parsed.clone().chain_io_k(|n| IO::of(n + 1));
    assert_eq!(io.run(env(), bg()).await, Ok(13));

    let io_result = parsed
        .clone()
        .chain_io_result_k(|n| crate::io_result::IOResult::of(n * 2));
    assert_eq!(io_result.run(env(), bg()).await, Ok(24));

    let reader = parsed
        .clone()
        .chain_reader_k(|n| Reader::asks(move |e: Env| n * e.factor));
    assert_eq!(reader.run(env(), bg()).await, Ok(36));

    let reader_io = parsed
        .clone()
        .chain_reader_io_k(|n| ReaderIO::asks(move |e: Env| format!("{}:{}", e.name, n)));
    assert_eq!(reader_io.run(env(), bg()).await, Ok("svc:12".to_string()));

    let missing = parsed.chain_option_k(|| Error::msg("odd"), |n| (n % 2 == 1).then_some(n));
    assert_eq!(missing.run(env(), bg()).await, Err(Error::msg("odd")));
}

#[tokio::test]
async fn test_chain_first_io_k_runs_effect() {
    let counter = CallCounter::new();
    let rrior = of::<Env, _>("v").chain_first_io_k({
        let counter = counter.clone();
        move |_| {
            let counter = counter.clone();
            IO::from_fn(move || counter.hit())
        }
    });

    assert_eq!(rrior.run(env(), bg()).await, Ok("v"));
    assert_eq!(counter.count(), 1);
}

#[tokio::test]
async fn test_from_option_and_predicate() {
    let require = from_option::<Env, i32, _>(|| Error::msg("none"));
    assert_eq!(require(Some(1)).run(env(), bg()).await, Ok(1));
    assert_eq!(require(None).run(env(), bg()).await, Err(Error::msg("none")));

    let positive = from_predicate::<Env, i32, _, _>(|n| *n > 0, |n| Error::msg(format!("{} <= 0", n)));
    assert_eq!(positive(5).run(env(), bg()).await, Ok(5));
    assert_eq!(
        positive(-1).run(env(), bg()).await,
        Err(Error::msg("-1 <= 0"))
    );
}

#[tokio::test]
async fn test_lifts_from_narrower_layers() {
    let reader = from_reader(Reader::asks(|e: Env| e.factor + 1));
    assert_eq!(reader.run(env(), bg()).await, Ok(4));

    let reader_result = from_reader_result(Reader::new(|e: Env| {
        if e.factor > 0 {
            Ok(e.factor)
        } else {
            Err(Error::msg("non-positive"))
        }
    }));
    assert_eq!(reader_result.run(env(), bg()).await, Ok(3));

    let reader_io = from_reader_io(ReaderIO::asks(|e: Env| e.name.len()));
    assert_eq!(reader_io.run(env(), bg()).await, Ok(3));

    let rior = from_reader_io_result(crate::ReaderIOResult::asks(|e: Env| Ok(e.factor * 10)));
    assert_eq!(rior.run(env(), bg()).await, Ok(30));

    let from_ctx = from_context_reader::<Env, bool>(crate::ReaderIOResult::asks(|ctx: Context| {
        Ok(ctx.deadline().is_some())
    }));
    assert_eq!(from_ctx.run(env(), bg()).await, Ok(false));

    let result = from_result::<Env, i32>(Err(Error::msg("r")));
    assert_eq!(result.run(env(), bg()).await, Err(Error::msg("r")));
}

#[tokio::test]
async fn test_context_reader_round_trip() {
    let original = asks(|e: Env| e.factor);
    let round_trip = from_context_reader::<Env, i32>(original.read(env()));

    let other = Env {
        name: "ignored".into(),
        factor: 100,
    };
    assert_eq!(round_trip.run(other, bg()).await, Ok(3));
}

#[tokio::test(start_paused = true)]
async fn test_with_timeout_cancels_slow_leaf() {
    let slow = from_async(|_: Env, _: Context| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(1)
    });

    let result = slow.with_timeout(Duration::from_secs(1)).run(env(), bg()).await;
    assert_eq!(result, Err(Error::deadline_exceeded()));
}

#[tokio::test(start_paused = true)]
async fn test_with_timeout_leaves_fast_computation_alone() {
    let fast = of::<Env, _>(1).with_timeout(Duration::from_secs(1));
    assert_eq!(fast.run(env(), bg()).await, Ok(1));
}

#[tokio::test(start_paused = true)]
async fn test_with_deadline_is_visible_to_leaf() {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let seen = from_async(|_: Env, ctx: Context| async move { Ok(ctx.deadline()) })
        .with_deadline(deadline);

    assert_eq!(seen.run(env(), bg()).await, Ok(Some(deadline)));
}

#[tokio::test(start_paused = true)]
async fn test_with_timeout_starts_counting_when_polled() {
    let leaf = from_async(|_: Env, _: Context| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(1)
    });

    let fut = leaf.with_timeout(Duration::from_millis(100)).run(env(), bg());
    tokio::time::advance(Duration::from_millis(200)).await;

    assert_eq!(fut.await, Ok(1));
}

#[tokio::test(start_paused = true)]
async fn test_with_deadline_still_releases_bracket() {
    let released = Recorder::new();
    let rrior = bracket(
        of::<Env, _>("conn"),
        |_| {
            ReaderReaderIOResult::new(|_: Env, _: Context| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
        },
        {
            let released = released.clone();
            move |res: &'static str, outcome: &crate::error::Result<()>| {
                let entry = (res, outcome.is_err());
                let released = released.clone();
                from_io(IO::from_fn(move || released.push(entry)))
            }
        },
    )
    .with_deadline(tokio::time::Instant::now() + Duration::from_millis(10));

    assert_eq!(
        rrior.run(env(), bg()).await,
        Err(Error::deadline_exceeded())
    );
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(released.entries(), vec![("conn", true)]);
}

#[tokio::test]
async fn test_with_context_guards_pure_computation() {
    let guarded = of::<Env, _>(1).with_context();
    crate::assert_cancelled!(guarded.run(env(), cancelled_context()).await);
}

#[tokio::test]
async fn test_instrument_returns_value() {
    let rrior = of::<Env, _>(42).instrument(::tracing::info_span!("test_span"));
    assert_eq!(rrior.run(env(), bg()).await, Ok(42));
}

// Do-notation

#[derive(Clone, Debug, Default, PartialEq)]
struct State {
    name: String,
    count: i32,
    doubled: i32,
}

fn count_lens() -> Lens<State, i32> {
    Lens::new(|s: &State| s.count, |s: State, count| State { count, ..s })
}

#[tokio::test]
async fn test_do_notation_builds_state() {
    let pipeline = do_::<Env, _>(State::default())
        .bind(|s, name| State { name, ..s }, |_| asks(|e: Env| e.name))
        .bind(|s, count| State { count, ..s }, |_| asks(|e: Env| e.factor))
        .let_(|s, doubled| State { doubled, ..s }, |s| s.count * 2);

    assert_eq!(
        pipeline.run(env(), bg()).await,
        Ok(State {
            name: "svc".into(),
            count: 3,
            doubled: 6,
        })
    );
}

#[tokio::test]
async fn test_do_notation_stops_at_first_failure() {
    let counter = CallCounter::new();
    let pipeline = do_::<Env, _>(State::default())
        .bind(|s, _: ()| s, |_| left(Error::msg("step 1")))
        .bind(|s, n: usize| State { count: n as i32, ..s }, {
            let counter = counter.clone();
            move |_| counted(&counter)
        });

    assert_eq!(pipeline.run(env(), bg()).await, Err(Error::msg("step 1")));
    assert_eq!(counter.count(), 0);
}

#[tokio::test]
async fn test_bind_to_let_to_and_ap_s() {
    let pipeline = asks(|e: Env| e.name)
        .bind_to(|name| State {
            name,
            ..State::default()
        })
        .let_to(|s, count| State { count, ..s }, 10)
        .ap_s(|s, doubled| State { doubled, ..s }, of(20));

    let state = pipeline.run(env(), bg()).await.unwrap();
    assert_eq!(state.name, "svc");
    assert_eq!(state.count, 10);
    assert_eq!(state.doubled, 20);
}

#[tokio::test]
async fn test_lens_do_notation() {
    let pipeline = do_::<Env, _>(State::default())
        .let_to_l(count_lens(), 2)
        .bind_l(count_lens(), |count| asks(move |e: Env| count * e.factor))
        .let_l(count_lens(), |count| count + 1)
        .ap_s_l(
            Lens::new(|s: &State| s.doubled, |s: State, doubled| State { doubled, ..s }),
            of(99),
        );

    let state = pipeline.run(env(), bg()).await.unwrap();
    assert_eq!(state.count, 7);
    assert_eq!(state.doubled, 99);
}

// Local

#[tokio::test]
async fn test_local_then_read_matches_direct_run() {
    let on_name = asks(|name: String| name.len());
    let on_env = on_name.clone().local(|e: Env| e.name);

    assert_eq!(
        on_env.run(env(), bg()).await,
        on_name.run("svc".to_string(), bg()).await
    );
}

#[tokio::test]
async fn test_promap() {
    let rrior = asks(|n: i32| n * 2).promap(|e: Env| e.factor, |n| format!("{}!", n));
    assert_eq!(rrior.run(env(), bg()).await, Ok("6!".to_string()));
}

#[tokio::test]
async fn test_local_result_k_failure_skips_computation() {
    let counter = CallCounter::new();
    let inner = {
        let counter = counter.clone();
        from_io::<i32, _>(IO::from_fn(move || counter.hit()))
    };

    let ok = inner.clone().local_result_k(|e: Env| Ok(e.factor));
    assert_eq!(ok.run(env(), bg()).await, Ok(0));

    let failed = inner.local_result_k(|_: Env| Err(Error::msg("bad env")));
    assert_eq!(failed.run(env(), bg()).await, Err(Error::msg("bad env")));
    assert_eq!(counter.count(), 1);
}

#[tokio::test]
async fn test_local_io_variants() {
    let inner = asks(|n: i32| n + 1);

    let via_io = inner.clone().local_io_k(|e: Env| IO::of(e.factor));
    assert_eq!(via_io.run(env(), bg()).await, Ok(4));

    let via_io_result = inner
        .clone()
        .local_io_result_k(|_: Env| crate::io_result::IOResult::left(Error::msg("io")));
    assert_eq!(via_io_result.run(env(), bg()).await, Err(Error::msg("io")));

    let via_ctx = inner.local_reader_io_result_k(|e: Env| {
        crate::ReaderIOResult::asks(move |ctx: Context| {
            Ok(if ctx.is_done() { 0 } else { e.factor * 10 })
        })
    });
    assert_eq!(via_ctx.run(env(), bg()).await, Ok(31));
    crate::assert_cancelled!(via_ctx.run(env(), cancelled_context()).await);
}

// Flip

#[tokio::test]
async fn test_sequence_flips_environments() {
    let nested = asks(|e: Env| asks(move |suffix: &'static str| format!("{}{}", e.name, suffix)));
    let flipped = sequence(nested);
    assert_eq!(
        flipped.run("-v1").run(env(), bg()).await,
        Ok("svc-v1".to_string())
    );
}

#[tokio::test]
async fn test_sequence_reader_variants() {
    let reader = of::<Env, _>(Reader::asks(|n: i32| n * 2));
    assert_eq!(sequence_reader(reader).run(21).run(env(), bg()).await, Ok(42));

    let reader_io = of::<Env, _>(ReaderIO::asks(|n: i32| n + 1));
    assert_eq!(
        sequence_reader_io(reader_io).run(1).run(env(), bg()).await,
        Ok(2)
    );

    let rior = of::<Env, _>(crate::ReaderIOResult::asks(|n: i32| {
        if n > 0 {
            Ok(n)
        } else {
            Err(Error::msg("not positive"))
        }
    }));
    let flipped = sequence_reader_io_result(rior);
    assert_eq!(flipped.run(5).run(env(), bg()).await, Ok(5));
    assert_eq!(
        flipped.run(0).run(env(), bg()).await,
        Err(Error::msg("not positive"))
    );
}

#[tokio::test]
async fn test_traverse_variants() {
    let base = asks(|e: Env| e.factor);

    let t = traverse(base.clone(), |factor| asks(move |n: i32| n * factor));
    assert_eq!(t.run(5).run(env(), bg()).await, Ok(15));

    let tr = traverse_reader(base, |factor| Reader::asks(move |n: i32| n + factor));
    assert_eq!(tr.run(5).run(env(), bg()).await, Ok(8));
}

// Arrays

#[tokio::test]
async fn test_sequence_array_collects_in_order() {
    let all = sequence_array(vec![of(1), asks(|e: Env| e.factor), of(5)]);
    assert_eq!(all.run(env(), bg()).await, Ok(vec![1, 3, 5]));
}

#[tokio::test]
async fn test_sequence_array_stops_at_first_failure() {
    let counter = CallCounter::new();
    let all = sequence_array(vec![
        counted(&counter),
        left(Error::msg("second")),
        counted(&counter),
    ]);

    assert_eq!(all.run(env(), bg()).await, Err(Error::msg("second")));
    assert_eq!(counter.count(), 1);
}

#[tokio::test]
async fn test_traverse_array_with_index() {
    let labels = traverse_array_with_index(vec!["a", "b"], |i, s| {
        asks(move |e: Env| format!("{}{}{}", e.name, s, i))
    });
    assert_eq!(
        labels.run(env(), bg()).await,
        Ok(vec!["svca0".to_string(), "svcb1".to_string()])
    );

    let doubled = traverse_array(1..=3, |n| of::<Env, _>(n * 2));
    assert_eq!(doubled.run(env(), bg()).await, Ok(vec![2, 4, 6]));
}

#[tokio::test]
async fn test_par_variants_report_lowest_index_error() {
    let all = sequence_array_par(vec![
        of::<Env, _>(1),
        left(Error::msg("index 1")),
        left(Error::msg("index 2")),
    ]);
    assert_eq!(all.run(env(), bg()).await, Err(Error::msg("index 1")));

    let ok = traverse_array_par(vec![1, 2, 3], |n| asks(move |e: Env| n * e.factor));
    assert_eq!(ok.run(env(), bg()).await, Ok(vec![3, 6, 9]));
}

#[tokio::test(start_paused = true)]
async fn test_sequence_array_par_is_concurrent() {
    let items = (0..4).map(|i| {
        from_async(move |_: Env, _: Context| async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(i)
        })
    });

    let start = tokio::time::Instant::now();
    assert_eq!(
        sequence_array_par(items).run(env(), bg()).await,
        Ok(vec![0, 1, 2, 3])
    );
    assert!(start.elapsed() < Duration::from_secs(2));
}

// Retry

#[tokio::test(start_paused = true)]
async fn test_retrying_passes_status_to_action() {
    let statuses = Recorder::new();
    let rrior = retrying(
        RetryPolicy::constant_delay(Duration::from_millis(10)).with_max_retries(2),
        {
            let statuses = statuses.clone();
            move |status: &RetryStatus| {
                statuses.push(*status);
                left::<Env, ()>(Error::msg("always"))
            }
        },
        |result| result.is_err(),
    );

    assert_eq!(rrior.run(env(), bg()).await, Err(Error::msg("always")));
    let seen = statuses.entries();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], RetryStatus::default());
    assert_eq!(seen[2].iteration, 2);
    assert_eq!(seen[2].cumulative_delay, Duration::from_millis(20));
}

#[tokio::test]
async fn test_retrying_respects_check() {
    let counter = CallCounter::new();
    let rrior = retrying(
        RetryPolicy::limit_retries(5),
        {
            let counter = counter.clone();
            move |_: &RetryStatus| {
                counter.hit();
                left::<Env, ()>(Error::msg("permanent"))
            }
        },
        |result| matches!(result, Err(e) if e.root_message() == "transient"),
    );

    assert_eq!(rrior.run(env(), bg()).await, Err(Error::msg("permanent")));
    assert_eq!(counter.count(), 1);
}

// Logging

mod logging {
    use super::{bg, env, Env};
    use crate::effect::{bracket, left, of, retrying};
    use crate::error::Error;
    use crate::retry::{RetryPolicy, RetryStatus};
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_failed_release_is_logged() {
        let rrior = bracket(
            of::<Env, _>(1),
            |n| of(*n),
            |_, _| left::<Env, ()>(Error::msg("close failed")),
        );

        assert_eq!(rrior.run(env(), bg()).await, Ok(1));
        assert!(logs_contain("resource release failed"));
        assert!(logs_contain("close failed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_exhausted_retries_are_logged() {
        let rrior = retrying(
            RetryPolicy::limit_retries(2),
            |_: &RetryStatus| left::<Env, ()>(Error::msg("flaky")),
            |result| result.is_err(),
        );

        assert_eq!(rrior.run(env(), bg()).await, Err(Error::msg("flaky")));
        assert!(logs_contain("retrying"));
        assert!(logs_contain("retries exhausted"));
        assert!(logs_contain("attempts=3"));
    }
}
