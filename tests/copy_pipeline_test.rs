// End-to-end copy flow with in-memory extractor and publisher
use std::future::Future;
use std::sync::Mutex;

use copy_ticket::clipboard::ClipboardPublisher;
use copy_ticket::copy::copy_ticket;
use copy_ticket::error::AppError;
use copy_ticket::extract::{FieldExtractor, PageSnapshot};
use copy_ticket::format::ClipboardPayload;
use copy_ticket::profile::{Profile, ProfileCollection, ProfilePatch};
use copy_ticket::rules::ReplacementRule;
use copy_ticket::ticket::{FieldTarget, TicketFields};

#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<ClipboardPayload>>,
}

impl ClipboardPublisher for RecordingPublisher {
    fn publish(&self, payload: &ClipboardPayload) -> impl Future<Output = Result<(), AppError>> + Send {
        self.sent.lock().expect("lock").push(payload.clone());
        std::future::ready(Ok(()))
    }
}

struct FailingPublisher;

impl ClipboardPublisher for FailingPublisher {
    fn publish(&self, _payload: &ClipboardPayload) -> impl Future<Output = Result<(), AppError>> + Send {
        std::future::ready(Err(AppError::Clipboard("busy".to_string())))
    }
}

struct FixedExtractor(TicketFields);

impl FieldExtractor for FixedExtractor {
    fn extract(&self) -> impl Future<Output = Result<TicketFields, AppError>> + Send {
        std::future::ready(Ok(self.0.clone()))
    }
}

fn collection_with_jira_rule() -> ProfileCollection {
    let template = Profile::template();
    let (collection, id) = ProfileCollection::seeded(&template).add_profile(&template);
    collection
        .update_profile(
            id,
            &ProfilePatch::new()
                .name("Jira")
                .replacements(vec![ReplacementRule::new("PROJ", "JIRA", FieldTarget::Id)]),
        )
        .and_then(|c| c.set_default(id))
        .expect("prepare collection")
}

#[tokio::test]
async fn test_copy_uses_default_profile() {
    let publisher = RecordingPublisher::default();
    let extractor = FixedExtractor(TicketFields::new(
        "PROJ-123",
        "Fix login bug",
        "https://x/browse/PROJ-123",
    ));

    let outcome = copy_ticket(&collection_with_jira_rule(), &extractor, &publisher)
        .await
        .expect("copy");

    assert_eq!(outcome.profile_name, "Jira");
    assert_eq!(outcome.feedback(), "Copied: Jira");
    assert_eq!(
        outcome.payload.plain_text,
        "[JIRA-123 | Fix login bug](https://x/browse/PROJ-123)"
    );
    assert_eq!(
        outcome.payload.html.as_deref(),
        Some("<a href=\"https://x/browse/PROJ-123\">JIRA-123 | Fix login bug</a>")
    );
    assert_eq!(publisher.sent.lock().expect("lock").as_slice(), &[outcome.payload.clone()]);
}

#[tokio::test]
async fn test_copy_from_page_snapshot() {
    let publisher = RecordingPublisher::default();
    let snapshot = PageSnapshot::new("https://acme.atlassian.net/jira/boards/7?selectedIssue=PROJ-9&view=detail")
        .with_summary("Crash on save");

    let collection = ProfileCollection::seeded(&Profile::template());
    let outcome = copy_ticket(&collection, &snapshot, &publisher).await.expect("copy");

    assert_eq!(outcome.profile_name, "Standard");
    assert_eq!(
        outcome.payload.plain_text,
        "[PROJ-9 | Crash on save](https://acme.atlassian.net/browse/PROJ-9)"
    );
}

#[tokio::test]
async fn test_extraction_failure_skips_publish() {
    let publisher = RecordingPublisher::default();
    let collection = ProfileCollection::seeded(&Profile::template());

    let result = copy_ticket(&collection, &PageSnapshot::new(""), &publisher).await;

    assert!(matches!(result, Err(AppError::MissingField("url"))));
    assert!(publisher.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn test_publish_failure_is_reported() {
    let collection = ProfileCollection::seeded(&Profile::template());
    let extractor = FixedExtractor(TicketFields::new("A-1", "T", "https://x/browse/A-1"));

    let result = copy_ticket(&collection, &extractor, &FailingPublisher).await;
    assert!(matches!(result, Err(AppError::Clipboard(_))));
}
