//! Room sessions end to end: reqwest and tokio-tungstenite adapters against the
//! mock AMA server
//!
//! Run with: cargo test -p integration-tests --test session_tests

use ama_core::{MessageId, ReactionDirection, RoomId};
use ama_sync::{ChannelState, SessionNoticeKind};
use anyhow::Result;
use integration_tests::{
    wait_for_notice, wait_for_view, SeededRoom, TestServer, GARBAGE_FRAMES,
};

// ============================================================================
// Bulk read and live feed
// ============================================================================

#[tokio::test]
async fn test_own_question_appears_once() -> Result<()> {
    let server = TestServer::start().await?;
    let room = SeededRoom::create(&server.state, &["First?"]);
    let session = server.open_session(&room.room_id)?;

    assert_eq!(session.load().await?, 1);
    server.wait_for_subscribers(&room.room_id, 1).await?;

    // Posted through REST, delivered through the live channel only
    let id = server
        .api()?
        .create_message(&RoomId::from(room.room_id.clone()), "Second?")
        .await?;

    let view = wait_for_view(&session, |v| v.len() == 2).await?;
    assert_eq!(view.ids(), vec![room.message_ids[0].as_str(), id.as_str()]);
    assert!(view.loaded);
    assert_eq!(view.connection, ChannelState::Open);

    // A repeated load is served from the store
    assert_eq!(session.load().await?, 2);
    assert_eq!(server.state.fetch_count(), 1);

    session.close().await;
    Ok(())
}

#[tokio::test]
async fn test_updates_from_other_participants() -> Result<()> {
    let server = TestServer::start().await?;
    let room = SeededRoom::create(&server.state, &["Q1", "Q2"]);
    let (q1, q2) = (&room.message_ids[0], &room.message_ids[1]);
    let session = server.open_session(&room.room_id)?;

    session.load().await?;
    server.wait_for_subscribers(&room.room_id, 1).await?;

    for frame in GARBAGE_FRAMES {
        server.state.send_raw(&room.room_id, frame);
    }
    server.state.mark_answered(&room.room_id, q1);
    server.state.react(&room.room_id, q2, true);
    server.state.react(&room.room_id, q2, true);

    let (id1, id2) = (MessageId::from(q1.clone()), MessageId::from(q2.clone()));
    let view = wait_for_view(&session, |v| {
        v.message(&id1).is_some_and(|m| m.answered)
            && v.message(&id2).is_some_and(|m| m.reaction_count == 2)
    })
    .await?;

    assert_eq!(view.len(), 2);
    assert!(!view.shows_reacted(&id2));
    // Bad frames did not cost the connection
    assert_eq!(server.state.subscriber_count(&room.room_id), 1);

    session.close().await;
    Ok(())
}

#[tokio::test]
async fn test_failed_load_can_be_retried() -> Result<()> {
    let server = TestServer::start().await?;
    let room = SeededRoom::create(&server.state, &["Q"]);
    let session = server.open_session(&room.room_id)?;
    let mut notices = session.notices();

    server.state.fail_next_fetches(1);
    let err = session.load().await.unwrap_err();
    assert!(err.is_retryable());
    wait_for_notice(&mut notices, |n| {
        matches!(n.kind, SessionNoticeKind::LoadFailed(_))
    })
    .await?;
    assert!(!session.view().loaded);

    assert_eq!(session.load().await?, 1);
    assert_eq!(server.state.fetch_count(), 2);

    session.close().await;
    Ok(())
}

// ============================================================================
// Reactions
// ============================================================================

#[tokio::test]
async fn test_reaction_round_trip() -> Result<()> {
    let server = TestServer::start().await?;
    let room = SeededRoom::create(&server.state, &["Q"]);
    let id = MessageId::from(room.message_ids[0].clone());
    let session = server.open_session(&room.room_id)?;

    session.load().await?;
    server.wait_for_subscribers(&room.room_id, 1).await?;

    let receipt = session.react(&id, ReactionDirection::Add).await?;
    assert_eq!(receipt.count, 1);
    let view = session.view();
    assert!(view.shows_reacted(&id));
    assert_eq!(view.message(&id).map(|m| m.reaction_count), Some(1));

    // Someone else joins in
    server.state.react(&room.room_id, id.as_str(), true);
    wait_for_view(&session, |v| {
        v.message(&id).is_some_and(|m| m.reaction_count == 2)
    })
    .await?;

    let receipt = session.toggle_reaction(&id).await?;
    assert_eq!(receipt.direction, ReactionDirection::Remove);
    assert_eq!(receipt.count, 1);

    let view = wait_for_view(&session, |v| {
        !v.shows_reacted(&id) && v.message(&id).is_some_and(|m| m.reaction_count == 1)
    })
    .await?;
    assert!(!view.reaction(&id).is_pending());

    session.close().await;
    Ok(())
}

#[tokio::test]
async fn test_failed_reaction_reverts() -> Result<()> {
    let server = TestServer::start().await?;
    let room = SeededRoom::create(&server.state, &["Q"]);
    let id = MessageId::from(room.message_ids[0].clone());
    let session = server.open_session(&room.room_id)?;
    let mut notices = session.notices();

    session.load().await?;
    server.state.fail_next_reactions(1);

    let err = session.toggle_reaction(&id).await.unwrap_err();
    assert!(err.is_user_facing());

    let view = session.view();
    assert!(!view.shows_reacted(&id));
    assert_eq!(view.message(&id).map(|m| m.reaction_count), Some(0));

    let notice = wait_for_notice(&mut notices, |n| {
        matches!(n.kind, SessionNoticeKind::ReactionFailed { .. })
    })
    .await?;
    assert_eq!(
        notice.message(),
        "Could not update your reaction, please try again"
    );

    // The guard is released; a retry goes through
    assert_eq!(session.toggle_reaction(&id).await?.count, 1);

    session.close().await;
    Ok(())
}

// ============================================================================
// Reconnect
// ============================================================================

#[tokio::test]
async fn test_resync_recovers_missed_events() -> Result<()> {
    let server = TestServer::start().await?;
    let room = SeededRoom::create(&server.state, &["Before"]);
    let session = server.open_session(&room.room_id)?;
    let mut notices = session.notices();

    session.load().await?;
    server.wait_for_subscribers(&room.room_id, 1).await?;

    let missed = server
        .state
        .insert_silently(&room.room_id, "Posted while nobody listened")
        .expect("room exists");
    assert_eq!(server.state.disconnect_subscribers(&room.room_id), 1);

    let notice = wait_for_notice(&mut notices, |n| {
        matches!(n.kind, SessionNoticeKind::Recovered { .. })
    })
    .await?;
    assert!(matches!(
        notice.kind,
        SessionNoticeKind::Recovered { attempts: 1 }
    ));

    let view = wait_for_view(&session, |v| v.len() == 2).await?;
    assert_eq!(
        view.ids(),
        vec![room.message_ids[0].as_str(), missed.as_str()]
    );
    assert_eq!(server.state.fetch_count(), 2);

    session.close().await;
    Ok(())
}

#[tokio::test]
async fn test_degraded_then_recovered() -> Result<()> {
    let server = TestServer::start().await?;
    let room = SeededRoom::create(&server.state, &["Q"]);
    let session = server.open_session(&room.room_id)?;
    let mut notices = session.notices();

    session.load().await?;
    server.wait_for_subscribers(&room.room_id, 1).await?;

    server.state.reject_subscriptions(true);
    server.state.disconnect_subscribers(&room.room_id);

    let degraded = wait_for_notice(&mut notices, |n| n.is_degraded()).await?;
    assert!(matches!(
        degraded.kind,
        SessionNoticeKind::Degraded { attempts: 3 }
    ));
    // The room stays readable while degraded
    assert_eq!(session.snapshot().len(), 1);

    server.state.reject_subscriptions(false);
    wait_for_notice(&mut notices, |n| {
        matches!(n.kind, SessionNoticeKind::Recovered { .. })
    })
    .await?;
    wait_for_view(&session, |v| v.connection.is_open()).await?;

    session.close().await;
    Ok(())
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_close_releases_subscription() -> Result<()> {
    let server = TestServer::start().await?;
    let room = SeededRoom::create(&server.state, &["Q"]);
    let session = server.open_session(&room.room_id)?;
    let views = session.watch();

    session.load().await?;
    server.wait_for_subscribers(&room.room_id, 1).await?;

    session.close().await;

    assert_eq!(views.borrow().connection, ChannelState::Closed);
    server.wait_for_subscribers(&room.room_id, 0).await?;
    Ok(())
}
