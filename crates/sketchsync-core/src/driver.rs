//! Glue between a surface and its backends.
//!
//! Hosts call `flush_persistence` after input handlers and `pump_realtime`
//! on every frame or socket wakeup.

use crate::document::CanvasId;
use crate::elements::{ElementId, LocalId};
use crate::persistence::{PersistRequest, PersistResult, PersistenceClient, UploadedImage};
use crate::render::RenderTarget;
use crate::surface::DrawingSurface;
use crate::sync::{ChannelError, RealtimeChannel};
use kurbo::Point;

/// Completed backend call, ready to be applied to a surface.
#[derive(Debug)]
pub enum PersistOutcome {
    Created {
        local_id: LocalId,
        result: PersistResult<ElementId>,
    },
    Updated {
        local_id: LocalId,
        result: PersistResult<()>,
    },
    Deleted {
        id: ElementId,
        result: PersistResult<()>,
    },
    ImageUploaded {
        at: Point,
        result: PersistResult<UploadedImage>,
    },
}

impl PersistOutcome {
    pub fn apply<R: RenderTarget>(self, surface: &mut DrawingSurface<R>) {
        match self {
            PersistOutcome::Created { local_id, result } => surface.on_created(local_id, result),
            PersistOutcome::Updated { local_id, result } => surface.on_updated(local_id, result),
            PersistOutcome::Deleted { id, result } => surface.on_deleted(id, result),
            PersistOutcome::ImageUploaded { at, result } => surface.on_image_uploaded(at, result),
        }
    }
}

/// Perform one queued request. Does not touch the surface, so hosts that
/// share the surface across tasks can await this without holding it.
pub async fn execute<P>(client: &P, canvas_id: CanvasId, request: PersistRequest) -> PersistOutcome
where
    P: PersistenceClient + ?Sized,
{
    log::debug!("Persisting: {}", request.name());
    match request {
        PersistRequest::Create {
            local_id,
            element_type,
            properties,
            z_index,
        } => PersistOutcome::Created {
            local_id,
            result: client
                .create(canvas_id, element_type, &properties, z_index)
                .await,
        },
        PersistRequest::Update {
            local_id,
            id,
            properties,
            z_index,
        } => PersistOutcome::Updated {
            local_id,
            result: client.update(id, &properties, z_index).await,
        },
        PersistRequest::Delete { id } => PersistOutcome::Deleted {
            id,
            result: client.delete(id).await,
        },
        PersistRequest::UploadImage { bytes, at } => PersistOutcome::ImageUploaded {
            at,
            result: client.upload_image(canvas_id, bytes).await,
        },
    }
}

/// Run every queued backend call and feed the results back.
///
/// Completions can queue follow-up requests (a deferred update, or a delete
/// for an element erased while its create was in flight), so this drains
/// until the queue stays empty. Returns the number of calls made.
pub async fn flush_persistence<R, P>(surface: &mut DrawingSurface<R>, client: &P) -> usize
where
    R: RenderTarget,
    P: PersistenceClient + ?Sized,
{
    let canvas_id = surface.canvas_id();
    let mut count = 0;
    while surface.has_pending_requests() {
        for request in surface.take_persist_requests() {
            count += 1;
            execute(client, canvas_id, request).await.apply(surface);
        }
    }
    count
}

/// Join the surface's canvas room.
pub fn connect<R, C>(surface: &DrawingSurface<R>, channel: &mut C) -> Result<(), ChannelError>
where
    R: RenderTarget,
    C: RealtimeChannel + ?Sized,
{
    channel.join(surface.canvas_id(), surface.current_user())?;
    log::info!(
        "Joined canvas {} as {}",
        surface.canvas_id(),
        surface.current_user().name
    );
    Ok(())
}

/// Publish outgoing events, then apply everything received.
///
/// Returns the number of inbound messages applied.
pub fn pump_realtime<R, C>(surface: &mut DrawingSurface<R>, channel: &mut C) -> usize
where
    R: RenderTarget,
    C: RealtimeChannel + ?Sized,
{
    for message in surface.take_outgoing() {
        if let Err(e) = channel.publish(&message) {
            log::error!("Failed to publish realtime event: {}", e);
        }
    }
    let inbound = channel.poll();
    let count = inbound.len();
    for message in inbound {
        surface.handle_server_message(message);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceConfig;
    use crate::elements::{Element, ElementKind, ElementType, Rectangle};
    use crate::persistence::MemoryPersistence;
    use crate::presence::{ActiveUser, UserId};
    use crate::render::testing::RecordingTarget;
    use crate::schedule::Instant;
    use crate::sync::{ClientMessage, LoopbackChannel, ServerMessage};
    use crate::tools::ToolKind;

    fn surface() -> DrawingSurface<RecordingTarget> {
        let config = SurfaceConfig {
            id: CanvasId(3),
            current_user: ActiveUser {
                id: UserId(1),
                name: "me".to_string(),
                profile_picture: None,
            },
            ..Default::default()
        };
        DrawingSurface::new(config, RecordingTarget::default()).unwrap()
    }

    fn draw_rect(s: &mut DrawingSurface<RecordingTarget>, from: Point, to: Point) {
        let now = Instant::now();
        s.set_tool(ToolKind::Rectangle);
        s.pointer_down(from, now);
        s.pointer_move(to, now);
        s.pointer_up(to);
    }

    #[test]
    fn test_flush_creates_and_publishes() {
        let backend = MemoryPersistence::new();
        let mut channel = LoopbackChannel::new();
        let mut s = surface();
        connect(&s, &mut channel).unwrap();
        assert_eq!(channel.joined(), Some((CanvasId(3), UserId(1))));

        draw_rect(&mut s, Point::new(0.0, 0.0), Point::new(40.0, 30.0));
        let calls = pollster::block_on(flush_persistence(&mut s, &backend));
        assert_eq!(calls, 1);

        let stored = backend.elements(CanvasId(3));
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].element_type, ElementType::Rectangle);
        let id = stored[0].id;
        assert_eq!(s.elements().iter().next().and_then(|e| e.id), id);

        pump_realtime(&mut s, &mut channel);
        let published = channel.take_published();
        assert!(matches!(published[0], ClientMessage::JoinCanvas { .. }));
        assert!(matches!(
            &published[1],
            ClientMessage::ElementAdded { element, .. } if element.id == id
        ));
    }

    #[test]
    fn test_deferred_update_flushes_in_one_pass() {
        let backend = MemoryPersistence::new();
        let mut s = surface();
        draw_rect(&mut s, Point::new(0.0, 0.0), Point::new(40.0, 40.0));

        let now = Instant::now();
        s.set_tool(ToolKind::Select);
        s.pointer_down(Point::new(20.0, 20.0), now);
        s.pointer_move(Point::new(70.0, 20.0), now);
        s.pointer_up(Point::new(70.0, 20.0));

        let calls = pollster::block_on(flush_persistence(&mut s, &backend));
        assert_eq!(calls, 2);
        let stored = backend.elements(CanvasId(3));
        assert_eq!(stored[0].properties.x, Some(50.0));
    }

    #[test]
    fn test_erase_during_create_deletes_on_backend() {
        let backend = MemoryPersistence::new();
        let mut s = surface();
        draw_rect(&mut s, Point::new(0.0, 0.0), Point::new(40.0, 40.0));
        let requests = s.take_persist_requests();

        s.set_tool(ToolKind::Eraser);
        s.pointer_down(Point::new(20.0, 20.0), Instant::now());

        // The create completes after the erase.
        for request in requests {
            let outcome = pollster::block_on(execute(&backend, CanvasId(3), request));
            assert!(matches!(outcome, PersistOutcome::Created { result: Ok(_), .. }));
            outcome.apply(&mut s);
        }
        assert_eq!(backend.elements(CanvasId(3)).len(), 1);
        pollster::block_on(flush_persistence(&mut s, &backend));
        assert!(backend.elements(CanvasId(3)).is_empty());
    }

    #[test]
    fn test_offline_backend_keeps_local_state() {
        let backend = MemoryPersistence::new();
        backend.set_offline(true);
        let mut s = surface();
        draw_rect(&mut s, Point::new(0.0, 0.0), Point::new(40.0, 40.0));
        pollster::block_on(flush_persistence(&mut s, &backend));
        assert_eq!(s.elements().len(), 1);
        assert_eq!(s.elements().iter().next().and_then(|e| e.id), None);
        assert!(s.take_outgoing().is_empty());
    }

    #[test]
    fn test_image_upload_round_trip() {
        let backend = MemoryPersistence::new();
        let mut s = surface();
        s.set_tool(ToolKind::Image);
        s.pointer_down(Point::new(5.0, 5.0), Instant::now());
        s.begin_image_upload(vec![0x89, 0x50]);
        let calls = pollster::block_on(flush_persistence(&mut s, &backend));
        // Upload, then create.
        assert_eq!(calls, 2);
        let stored = backend.elements(CanvasId(3));
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].element_type, ElementType::Image);
        assert!(stored[0].properties.image_url.is_some());
    }

    #[test]
    fn test_pump_applies_remote_and_skips_echo() {
        let mut channel = LoopbackChannel::new();
        let mut s = surface();
        let wire = Element::persisted(
            ElementId(77),
            ElementKind::Rectangle(Rectangle::new(Point::ZERO, 5.0, 5.0)),
            1,
        )
        .to_wire();
        channel.deliver(ServerMessage::ElementAdded {
            element: wire.clone(),
            user_id: UserId(1),
        });
        channel.deliver(ServerMessage::ElementAdded {
            element: wire,
            user_id: UserId(2),
        });
        assert_eq!(pump_realtime(&mut s, &mut channel), 2);
        assert_eq!(s.elements().len(), 1);
    }

    #[test]
    fn test_closed_channel_logs_and_continues() {
        let backend = MemoryPersistence::new();
        let mut channel = LoopbackChannel::new();
        channel.close();
        let mut s = surface();
        assert!(connect(&s, &mut channel).is_err());
        draw_rect(&mut s, Point::new(0.0, 0.0), Point::new(40.0, 40.0));
        pollster::block_on(flush_persistence(&mut s, &backend));
        assert_eq!(pump_realtime(&mut s, &mut channel), 0);
        assert!(channel.published().is_empty());
    }
}
