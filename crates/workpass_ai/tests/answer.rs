mod common;

use pretty_assertions::assert_eq;
use workpass_ai::answer::{AnswerComposer, AnswerSettings};
use workpass_ai::index::{IndexBuildInput, Indexer};
use workpass_ai::retrieve::Retriever;
use workpass_ai::retry::RetryPolicy;
use workpass_ai::store::CollectionStore;
use workpass_core::domain::UserContext;

use common::{corpus, BrokenEmbedder, FakeLlm, KeywordEmbedder, RecordingSleeper};

const COLLECTION: &str = "singapore_work_passes";

fn indexed() -> CollectionStore {
    let mut store = CollectionStore::open_in_memory().expect("open store");
    Indexer::new(&KeywordEmbedder, RetryPolicy::no_retry(), &RecordingSleeper::default())
        .build(
            &mut store,
            &corpus(),
            IndexBuildInput {
                collection: COLLECTION.to_string(),
                model: "keyword-test".to_string(),
                batch_size: 16,
                updated_at: "2026-10-17T00:00:00Z".to_string(),
            },
        )
        .expect("build");
    store
}

fn settings(top_k: u32) -> AnswerSettings {
    AnswerSettings {
        top_k,
        ..AnswerSettings::default()
    }
}

#[test]
fn answer_cites_the_chunks_it_was_given() {
    let store = indexed();
    let llm = FakeLlm::replying("You need an Employment Pass.");
    let settings = settings(2);
    let composer = AnswerComposer::new(
        Retriever::new(&store, &KeywordEmbedder, COLLECTION),
        &llm,
        &settings,
    );

    let ctx = UserContext::new().with("nationality", "Indian").with("salary", "6000");
    let out = composer.answer("Which pass for a software engineer with employment offer?", Some(&ctx));

    assert_eq!(out.answer, "You need an Employment Pass.");
    assert_eq!(
        out.question,
        "Which pass for a software engineer with employment offer?"
    );
    assert_eq!(out.sources.len(), 2);
    assert_eq!(out.sources[0].title, "Employment Pass");
    assert_eq!(out.sources[0].pass_type, "Employment Pass");
    assert_eq!(out.sources[0].category, "employment_passes");

    let prompts = llm.prompts.borrow();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Employment Pass holders are foreign professionals."));
    assert!(prompts[0].contains("(User context: nationality: Indian, salary: 6000)"));
}

#[test]
fn generation_failure_degrades_to_an_error_answer() {
    let store = indexed();
    let llm = FakeLlm::failing();
    let settings = settings(5);
    let composer = AnswerComposer::new(
        Retriever::new(&store, &KeywordEmbedder, COLLECTION),
        &llm,
        &settings,
    );

    let out = composer.answer("What are the fees?", None);
    assert!(out.answer.starts_with("I encountered an error: "));
    assert!(out.answer.ends_with(". Please try again."));
    assert!(out.answer.contains("model overloaded"));
    assert!(out.sources.is_empty());
    assert_eq!(out.question, "What are the fees?");
}

#[test]
fn retrieval_failure_degrades_without_calling_the_model() {
    let store = indexed();
    let llm = FakeLlm::replying("unused");
    let settings = settings(5);
    let composer = AnswerComposer::new(
        Retriever::new(&store, &BrokenEmbedder, COLLECTION),
        &llm,
        &settings,
    );

    let out = composer.answer("What is an S Pass?", None);
    assert!(out.answer.starts_with("I encountered an error: "));
    assert!(out.sources.is_empty());
    assert!(llm.prompts.borrow().is_empty());
}

#[test]
fn empty_store_degrades_too() {
    let store = CollectionStore::open_in_memory().expect("open store");
    let llm = FakeLlm::replying("unused");
    let settings = settings(5);
    let composer = AnswerComposer::new(
        Retriever::new(&store, &KeywordEmbedder, COLLECTION),
        &llm,
        &settings,
    );

    let out = composer.answer("Anything?", None);
    assert!(out.answer.contains("AI_INDEX_NOT_READY"));
    assert!(out.sources.is_empty());
}
