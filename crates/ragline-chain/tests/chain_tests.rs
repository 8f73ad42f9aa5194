// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavioural tests for the retrieval chain against mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use ragline_chain::prompt::REPHRASE_SYSTEM_PROMPT;
use ragline_core::RaglineError;
use ragline_core::types::{Message, Role, SessionId};
use ragline_test_utils::{Scripted, StubEmbedder, TestHarness};

const Q1: &str = "What are the prerequisites for this course?";
const A1: &str = "You need linear algebra, Python and basic statistics.";
const Q2: &str = "Can you list them in bullet point form?";
const STANDALONE_Q2: &str =
    "What are the prerequisites for this course, listed in bullet point form?";
const A2: &str = "- linear algebra\n- Python\n- basic statistics";

#[tokio::test]
async fn first_question_is_used_as_is_without_a_rephrase_call() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![A1.into()])
        .build()
        .await
        .unwrap();

    let output = harness.ask("s1", Q1).await.unwrap();
    assert_eq!(output.standalone_question, Q1);
    assert_eq!(output.answer, A1);

    let requests = harness.provider.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].messages[0].content.starts_with("You are an experienced researcher"));
}

#[tokio::test]
async fn follow_up_is_rephrased_against_history() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![A1.into(), STANDALONE_Q2.into(), A2.into()])
        .build()
        .await
        .unwrap();

    harness.ask("course", Q1).await.unwrap();
    let output = harness.ask("course", Q2).await.unwrap();

    assert_eq!(output.standalone_question, STANDALONE_Q2);
    assert!(!output.standalone_question.contains(" them "));
    assert_eq!(output.answer, A2);

    let requests = harness.provider.requests().await;
    assert_eq!(requests.len(), 3);

    let rephrase = &requests[1];
    assert_eq!(rephrase.temperature, Some(0.1));
    assert_eq!(
        rephrase.messages,
        vec![
            Message::system(REPHRASE_SYSTEM_PROMPT),
            Message::human(Q1),
            Message::assistant(A1),
            Message::human(format!(
                "Rephrase the following question as a standalone question:\n{Q2}"
            )),
        ]
    );

    let answer = &requests[2];
    let last = answer.messages.last().unwrap();
    assert_eq!(last.role, Role::Human);
    assert!(last.content.ends_with(STANDALONE_Q2));
    assert_eq!(&answer.messages[1..3], &[Message::human(Q1), Message::assistant(A1)]);

    assert_eq!(
        harness.history("course").await,
        vec![
            Message::human(Q1),
            Message::assistant(A1),
            Message::human(Q2),
            Message::assistant(A2),
        ]
    );
}

#[tokio::test]
async fn retrieval_returns_top_four_with_ties_in_insertion_order() {
    let embedder = StubEmbedder::with_dimensions(3)
        .with_vector("which doc?", vec![1.0, 0.0, 0.0])
        .with_vector("unrelated", vec![0.0, 0.0, 1.0])
        .with_vector("tie one", vec![1.0, 1.0, 0.0])
        .with_vector("best", vec![5.0, 0.0, 0.0])
        .with_vector("tie two", vec![1.0, 1.0, 0.0])
        .with_vector("second", vec![1.0, 0.1, 0.0])
        .with_vector("tie three", vec![1.0, 1.0, 0.0]);
    let harness = TestHarness::builder()
        .with_embedder(embedder)
        .with_documents(["unrelated", "tie one", "best", "tie two", "second", "tie three"])
        .with_top_k(4)
        .build()
        .await
        .unwrap();

    let output = harness.ask("s", "which doc?").await.unwrap();
    let texts: Vec<_> = output.context.iter().map(|c| c.chunk.text.as_str()).collect();
    assert_eq!(texts, ["best", "second", "tie one", "tie two"]);

    let system = &harness.provider.requests().await[0].messages[0].content;
    assert!(system.contains(concat!(
        "<context>\n",
        "<doc>\nbest\n</doc>\n",
        "<doc>\nsecond\n</doc>\n",
        "<doc>\ntie one\n</doc>\n",
        "<doc>\ntie two\n</doc>\n",
        "</context>"
    )));
}

#[tokio::test]
async fn empty_index_still_generates_an_answer() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["I could not find anything.".into()])
        .build()
        .await
        .unwrap();

    let output = harness.ask("s", "anything?").await.unwrap();
    assert!(output.context.is_empty());
    assert_eq!(output.answer, "I could not find anything.");

    let system = &harness.provider.requests().await[0].messages[0].content;
    assert!(system.ends_with("<context>\n\n</context>"));
}

#[tokio::test]
async fn streamed_tokens_concatenate_to_buffered_answer() {
    let answer = "Rayleigh scattering makes\nthe sky  look blue.";
    let buffered = TestHarness::builder()
        .with_mock_responses(vec![answer.into()])
        .build()
        .await
        .unwrap();
    let streamed = TestHarness::builder()
        .with_mock_responses(vec![answer.into()])
        .build()
        .await
        .unwrap();

    let full = buffered.ask("s", "Why is the sky blue?").await.unwrap().answer;

    let mut tokens = streamed
        .chain
        .stream(&SessionId::from("s"), "Why is the sky blue?")
        .await
        .unwrap();
    let mut pieces = Vec::new();
    while let Some(token) = tokens.next().await {
        pieces.push(token.unwrap());
    }
    drop(tokens);

    assert_eq!(pieces, ragline_test_utils::word_tokens(answer));
    assert_eq!(pieces.concat(), full);
    assert_eq!(streamed.history("s").await, buffered.history("s").await);
}

#[tokio::test]
async fn failed_stream_records_nothing() {
    let harness = TestHarness::builder()
        .with_script(vec![Scripted::BrokenStream {
            text: "partial answer that breaks".into(),
            after: 2,
        }])
        .build()
        .await
        .unwrap();

    let err = harness.ask_streaming("s", "question").await.unwrap_err();
    assert!(matches!(err, RaglineError::Provider { .. }));
    assert!(harness.history("s").await.is_empty());

    // The session is usable again once the failed stream is gone.
    let answer = harness.ask_streaming("s", "again").await.unwrap();
    assert_eq!(answer, ragline_test_utils::DEFAULT_RESPONSE);
    assert_eq!(harness.history("s").await.len(), 2);
}

#[tokio::test]
async fn dropped_stream_records_nothing_and_releases_the_session() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["one two three four".into(), "second answer".into()])
        .build()
        .await
        .unwrap();

    let mut tokens = harness
        .chain
        .stream(&SessionId::from("s"), "first")
        .await
        .unwrap();
    assert_eq!(tokens.next().await.unwrap().unwrap(), "one ");
    drop(tokens);

    assert!(harness.history("s").await.is_empty());
    let output = harness.ask("s", "second").await.unwrap();
    assert_eq!(output.answer, "second answer");
}

#[tokio::test]
async fn provider_failure_propagates_and_leaves_history_untouched() {
    let harness = TestHarness::builder()
        .with_script(vec![
            Scripted::Text(A1.into()),
            Scripted::Failure("upstream unavailable".into()),
        ])
        .build()
        .await
        .unwrap();

    harness.ask("s", Q1).await.unwrap();
    let err = harness.ask("s", Q2).await.unwrap_err();
    assert!(err.is_upstream());
    assert!(err.to_string().contains("upstream unavailable"));
    assert_eq!(harness.history("s").await.len(), 2);
}

#[tokio::test]
async fn blank_question_is_invalid_request() {
    let harness = TestHarness::builder().build().await.unwrap();
    let err = harness.ask("s", "   ").await.unwrap_err();
    assert!(matches!(err, RaglineError::InvalidRequest(_)));
    assert_eq!(harness.provider.request_count().await, 0);
}

#[tokio::test]
async fn sessions_do_not_see_each_other() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["alpha answer".into(), "beta answer".into()])
        .build()
        .await
        .unwrap();

    harness.ask("alpha", "first alpha").await.unwrap();
    let beta = harness.ask("beta", "first beta").await.unwrap();

    // No history in "beta", so no rephrase call was made for it.
    assert_eq!(beta.standalone_question, "first beta");
    assert_eq!(harness.provider.request_count().await, 2);
    assert_eq!(
        harness.history("beta").await,
        vec![Message::human("first beta"), Message::assistant("beta answer")]
    );
    assert_eq!(harness.sessions.len(), 2);
}

#[tokio::test]
async fn concurrent_turns_on_one_session_are_serialized() {
    let harness = Arc::new(
        TestHarness::builder()
            .with_latency(Duration::from_millis(10))
            .build()
            .await
            .unwrap(),
    );

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let harness = Arc::clone(&harness);
            tokio::spawn(async move { harness.ask("shared", &format!("question {i}")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let history = harness.history("shared").await;
    assert_eq!(history.len(), 10);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, Role::Human);
        assert_eq!(pair[1].role, Role::Assistant);
    }
    for i in 0..5 {
        assert!(history.contains(&Message::human(format!("question {i}"))));
    }
}

#[tokio::test]
async fn bounded_history_keeps_latest_turns() {
    let mut config = ragline_config::RaglineConfig::default();
    config.session.max_history_messages = Some(2);
    let harness = TestHarness::builder()
        .with_config(config)
        .build()
        .await
        .unwrap();

    harness.ask("s", "one").await.unwrap();
    harness.ask("s", "two").await.unwrap();
    let history = harness.history("s").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], Message::human("two"));
}
