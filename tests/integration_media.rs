mod common;

use common::{memory_store, register_user, seed_course};
use edulife::modules::media::MediaService;
use edulife_models::media::{MediaError, VideoJobStatus};
use edulife_models::users::UserRole;

#[tokio::test]
async fn jobs_walk_the_pipeline_in_order() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let (_, _, lessons) = seed_course(&store, teacher.id, 0, 1).await;
    let media = MediaService::new(store.clone());

    let job = media
        .enqueue(lessons[0], "https://uploads.example.com/raw.mp4".into())
        .await
        .unwrap();
    assert_eq!(job.status, VideoJobStatus::Pending);
    assert_eq!(job.attempts, 0);

    let claimed = media.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed.id, job.id);
    assert_eq!(claimed.status, VideoJobStatus::Downloading);
    assert_eq!(claimed.attempts, 1);
    assert!(claimed.claimed_at.is_some());

    // The queue is empty while the job is in flight.
    assert!(media.claim_next().await.unwrap().is_none());

    media
        .advance(job.id, VideoJobStatus::Transcoding, None)
        .await
        .unwrap();
    media
        .advance(job.id, VideoJobStatus::Uploading, None)
        .await
        .unwrap();
    let done = media
        .advance(
            job.id,
            VideoJobStatus::Completed,
            Some("https://cdn.example.com/processed.mp4".into()),
        )
        .await
        .unwrap();
    assert_eq!(done.status, VideoJobStatus::Completed);
    assert_eq!(
        done.output_url.as_deref(),
        Some("https://cdn.example.com/processed.mp4")
    );
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn stages_cannot_be_skipped() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let (_, _, lessons) = seed_course(&store, teacher.id, 0, 1).await;
    let media = MediaService::new(store.clone());

    let job = media
        .enqueue(lessons[0], "https://uploads.example.com/raw.mp4".into())
        .await
        .unwrap();
    let err = media
        .advance(job.id, VideoJobStatus::Completed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::InvalidTransition { .. }));
}

#[tokio::test]
async fn failures_requeue_until_attempts_run_out() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let (_, _, lessons) = seed_course(&store, teacher.id, 0, 1).await;
    let media = MediaService::new(store.clone());

    let job = media
        .enqueue(lessons[0], "https://uploads.example.com/raw.mp4".into())
        .await
        .unwrap();
    assert_eq!(job.max_attempts, 3);

    for attempt in 1..=2 {
        let claimed = media.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.attempts, attempt);
        let failed = media.fail(job.id, "download timed out".into()).await.unwrap();
        assert_eq!(failed.status, VideoJobStatus::Pending);
    }

    // Third failure exhausts the attempts.
    media.claim_next().await.unwrap().unwrap();
    let failed = media.fail(job.id, "download timed out".into()).await.unwrap();
    assert_eq!(failed.status, VideoJobStatus::Failed);
    assert_eq!(failed.last_error.as_deref(), Some("download timed out"));
    assert!(media.claim_next().await.unwrap().is_none());
}

#[tokio::test]
async fn oldest_pending_job_is_claimed_first() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let (_, _, lessons) = seed_course(&store, teacher.id, 0, 2).await;
    let media = MediaService::new(store.clone());

    let first = media
        .enqueue(lessons[0], "https://uploads.example.com/a.mp4".into())
        .await
        .unwrap();
    let second = media
        .enqueue(lessons[1], "https://uploads.example.com/b.mp4".into())
        .await
        .unwrap();

    assert_eq!(media.claim_next().await.unwrap().unwrap().id, first.id);
    assert_eq!(media.claim_next().await.unwrap().unwrap().id, second.id);
}
