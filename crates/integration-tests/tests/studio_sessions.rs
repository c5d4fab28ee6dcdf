//! Session scenarios: history navigation, redo hits, busy rejection, credit
//! rollback and mixtape chains.

#![allow(clippy::indexing_slicing)]

use std::sync::Arc;

use fitting_room_core::{CreditBalance, GarmentId, POSE_INSTRUCTIONS, PoseIndex, SavedOutfitId};
use fitting_room_studio::models::NoticeLevel;
use fitting_room_studio::services::testing::{
    Harness, MemoryCredits, ScriptedGenerator, StaticSuggester, test_image,
};
use fitting_room_studio::services::{CREDIT_SAVE_FAILED, GenerationError, StudioError};

fn garment(id: &str) -> GarmentId {
    GarmentId::new(id)
}

async fn harness_with_model(credits: u32) -> Harness {
    let harness = Harness::new(credits + 1).await;
    harness
        .session
        .finalize_model(test_image("photo"))
        .await
        .expect("finalize");
    harness
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn test_reapplying_removed_garment_moves_forward_without_generating() {
    let harness = harness_with_model(5).await;
    let session = &harness.session;

    let view = session
        .apply_wardrobe_item(&garment("gemini-tee"))
        .await
        .expect("G1")
        .view;
    assert_eq!(view.layers.len(), 2);
    assert_eq!(view.current_index, 1);

    let view = session
        .apply_wardrobe_item(&garment("gemini-sweat"))
        .await
        .expect("G2")
        .view;
    assert_eq!(view.layers.len(), 3);
    assert_eq!(view.current_index, 2);
    let g2_image = view.display_image.clone();

    let view = session.remove_last().await.expect("remove").view;
    assert_eq!(view.current_index, 1);
    assert_eq!(view.layers.len(), 3);
    assert_eq!(view.active_garment_ids, vec![garment("gemini-tee")]);

    let calls = harness.generator.call_count().await;
    let credits = view.credits;

    let view = session
        .apply_wardrobe_item(&garment("gemini-sweat"))
        .await
        .expect("redo")
        .view;
    assert_eq!(view.current_index, 2);
    assert_eq!(view.layers.len(), 3);
    assert_eq!(view.display_image, g2_image);
    assert_eq!(harness.generator.call_count().await, calls);
    assert_eq!(view.credits, credits);
}

#[tokio::test]
async fn test_redo_after_pose_change_returns_to_front_pose() {
    let harness = harness_with_model(5).await;
    let session = &harness.session;

    session
        .apply_wardrobe_item(&garment("gemini-tee"))
        .await
        .expect("G1");
    let g2_image = session
        .apply_wardrobe_item(&garment("gemini-sweat"))
        .await
        .expect("G2")
        .view
        .display_image;
    session.remove_last().await.expect("remove");
    let posed = session.select_pose(2).await.expect("pose").view;
    assert_eq!(posed.pose_index.get(), 2);
    let calls = harness.generator.call_count().await;

    let view = session
        .apply_wardrobe_item(&garment("gemini-sweat"))
        .await
        .expect("redo")
        .view;

    assert_eq!(view.current_index, 2);
    assert_eq!(view.pose_index, PoseIndex::FRONT);
    assert_eq!(view.pose_instruction, POSE_INSTRUCTIONS[0]);
    assert_eq!(view.display_image, g2_image);
    assert_eq!(harness.generator.call_count().await, calls);

    // the next layer is rendered from the front view it is filed under
    let view = session
        .apply_wardrobe_item(&garment("beanie-hat"))
        .await
        .expect("G3")
        .view;
    assert_eq!(view.pose_index, PoseIndex::FRONT);
    assert_eq!(view.available_poses, vec![POSE_INSTRUCTIONS[0].to_string()]);
    let calls = harness.generator.calls().await;
    assert_eq!(calls.last().expect("call").images[0], g2_image.expect("image"));
}

#[tokio::test]
async fn test_new_garment_after_remove_truncates_redo_tail() {
    let harness = harness_with_model(5).await;
    let session = &harness.session;

    session
        .apply_wardrobe_item(&garment("gemini-tee"))
        .await
        .expect("G1");
    session
        .apply_wardrobe_item(&garment("gemini-sweat"))
        .await
        .expect("G2");
    session.remove_last().await.expect("remove");

    let view = session
        .apply_wardrobe_item(&garment("beanie-hat"))
        .await
        .expect("G3")
        .view;

    assert_eq!(view.layers.len(), 3);
    assert_eq!(view.current_index, 2);
    assert_eq!(
        view.active_garment_ids,
        vec![garment("gemini-tee"), garment("beanie-hat")]
    );
}

#[tokio::test]
async fn test_revert_to_base_keeps_layers_for_redo() {
    let harness = harness_with_model(5).await;
    let session = &harness.session;

    session
        .apply_wardrobe_item(&garment("gemini-tee"))
        .await
        .expect("G1");
    let view = session.revert_to(0).await.expect("revert").view;
    assert_eq!(view.current_index, 0);
    assert!(view.active_garment_ids.is_empty());
    assert_eq!(view.layers.len(), 2);

    let err = session.revert_to(5).await.expect_err("out of range");
    assert!(matches!(err, StudioError::InvalidInput(_)));
}

// =============================================================================
// Single flight
// =============================================================================

#[tokio::test]
async fn test_busy_session_rejects_second_action() {
    let harness = Harness::with(
        ScriptedGenerator::gated(),
        StaticSuggester::new(&[]),
        MemoryCredits::new(3),
    )
    .await;

    let session = Arc::clone(&harness.session);
    let first = tokio::spawn(async move { session.finalize_model(test_image("photo")).await });
    harness.generator.wait_entered().await;

    let view = harness.session.view().await;
    assert!(view.busy);
    assert_eq!(view.activity.as_deref(), Some("Creating your model..."));

    let err = harness
        .session
        .finalize_model(test_image("other"))
        .await
        .expect_err("busy");
    assert_eq!(err, StudioError::Busy);
    assert_eq!(harness.generator.call_count().await, 1);

    let wardrobe = harness
        .session
        .remove_wardrobe_item(&garment("beanie-hat"))
        .await
        .expect_err("busy");
    assert_eq!(wardrobe, StudioError::Busy);
    let library = harness.session.load_library().await.expect_err("busy");
    assert_eq!(library, StudioError::Busy);
    let delete = harness
        .session
        .delete_outfit(SavedOutfitId::generate())
        .await
        .expect_err("busy");
    assert_eq!(delete, StudioError::Busy);

    harness.generator.release();
    let outcome = first.await.expect("join").expect("finalize");
    assert!(!outcome.view.busy);
    assert!(
        outcome
            .view
            .wardrobe
            .iter()
            .any(|item| item.id == garment("beanie-hat"))
    );
    assert!(outcome.view.activity.is_none());
    assert_eq!(outcome.view.credits, CreditBalance::new(2));
}

// =============================================================================
// Credits
// =============================================================================

#[tokio::test]
async fn test_failed_credit_save_keeps_new_pose_and_restores_balance() {
    let harness = harness_with_model(1).await;
    assert_eq!(harness.session.credits().await, CreditBalance::new(1));
    harness.credits.fail_writes(true);

    let outcome = harness.session.select_pose(2).await.expect("pose");

    let notice = outcome.notice.expect("notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, CREDIT_SAVE_FAILED);
    assert_eq!(outcome.view.credits, CreditBalance::new(1));
    assert_eq!(outcome.view.pose_index.get(), 2);
    assert!(
        outcome
            .view
            .available_poses
            .iter()
            .any(|pose| pose == POSE_INSTRUCTIONS[2])
    );

    let calls = harness.generator.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(
        outcome.view.display_image,
        Some(test_image("generated-1")),
        "the generated pose is what is shown"
    );
}

#[tokio::test]
async fn test_credits_drop_by_one_per_generation_and_never_below_zero() {
    let harness = harness_with_model(1).await;

    let outcome = harness
        .session
        .apply_wardrobe_item(&garment("gemini-tee"))
        .await
        .expect("apply");
    assert_eq!(outcome.view.credits, CreditBalance::ZERO);

    let err = harness
        .session
        .apply_wardrobe_item(&garment("gemini-sweat"))
        .await
        .expect_err("out of credits");
    assert!(matches!(err, StudioError::InsufficientCredits(_)));
    assert_eq!(harness.credits.balance(harness.user_id).await, CreditBalance::ZERO);
}

// =============================================================================
// Mixtape
// =============================================================================

#[tokio::test]
async fn test_empty_suggestion_changes_nothing() {
    let harness = Harness::with(
        ScriptedGenerator::new(),
        StaticSuggester::new(&[]),
        MemoryCredits::new(4),
    )
    .await;
    harness
        .session
        .finalize_model(test_image("photo"))
        .await
        .expect("finalize");
    let before = harness.session.view().await;

    let err = harness
        .session
        .mixtape("beach day")
        .await
        .expect_err("empty");
    assert_eq!(err, StudioError::EmptySuggestion);
    assert!(err.user_message().contains("couldn't create an outfit"));

    let after = harness.session.view().await;
    assert_eq!(after.layers, before.layers);
    assert_eq!(after.credits, before.credits);
    assert_eq!(harness.generator.call_count().await, 1);
}

#[tokio::test]
async fn test_mixtape_keeps_layers_applied_before_a_failure() {
    let harness = Harness::with(
        ScriptedGenerator::new(),
        StaticSuggester::new(&["gemini-tee", "unknown-item", "aviator-sunglasses", "beanie-hat"]),
        MemoryCredits::new(6),
    )
    .await;
    harness
        .session
        .finalize_model(test_image("photo"))
        .await
        .expect("finalize");

    harness.generator.push(Ok(test_image("tee-on"))).await;
    harness
        .generator
        .push(Err(GenerationError::Blocked("SAFETY".to_string())))
        .await;

    let outcome = harness.session.mixtape("festival").await.expect("partial");

    let notice = outcome.notice.expect("notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("SAFETY"));
    assert_eq!(outcome.view.active_garment_ids, vec![garment("gemini-tee")]);
    assert_eq!(outcome.view.display_image, Some(test_image("tee-on")));
    assert_eq!(outcome.view.credits, CreditBalance::new(4));
    assert!(!outcome.view.busy);
}
