//! Sensor ingest
//!
//! Turns the host's byte stream into widget updates applied under the
//! renderer lock. Sensor updates never wait long for the lock: the next
//! sample is at most a second away, so a busy renderer just drops this one.
//! Screen changes driven by the host link are not optional: one that misses
//! its lock window is kept and retried on the next host event.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;
use sensorpanel_protocol::{BacklightSignal, Decoder, HostLink, LineAssembler, LinkUpdate, UpdateBatch};

use crate::config::RenderLoopConfig;
use crate::lock::RendererLock;
use crate::log::{debug, warn};
use crate::traits::WidgetSink;

/// Result of applying one decoded line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatchOutcome {
    /// Nothing to apply
    Empty,
    Applied,
    /// Lock stayed busy; nothing applied
    Skipped,
    /// Primary updates applied, follow-ups dropped
    FollowUpSkipped,
}

/// Apply `batch` with bounded lock waits
///
/// Primary and follow-up updates take the lock separately so a long
/// render iteration delays at most one of them.
pub async fn apply_batch<M, R>(
    lock: &RendererLock<M, R>,
    batch: &UpdateBatch,
    config: &RenderLoopConfig,
) -> BatchOutcome
where
    M: RawMutex,
    R: WidgetSink,
{
    if batch.is_empty() {
        return BatchOutcome::Empty;
    }

    if !batch.primary.is_empty() {
        let timeout = Duration::from_millis(config.update_lock_timeout_ms as u64);
        let Some(mut sink) = lock.lock_within(timeout).await else {
            warn!("renderer busy, update skipped");
            return BatchOutcome::Skipped;
        };
        for update in &batch.primary {
            sink.apply(update);
        }
    }

    if !batch.follow_up.is_empty() {
        let timeout = Duration::from_millis(config.follow_up_lock_timeout_ms as u64);
        let Some(mut sink) = lock.lock_within(timeout).await else {
            warn!("renderer busy, follow-up update skipped");
            return if batch.primary.is_empty() {
                BatchOutcome::Skipped
            } else {
                BatchOutcome::FollowUpSkipped
            };
        };
        for update in &batch.follow_up {
            sink.apply(update);
        }
    }

    BatchOutcome::Applied
}

/// Ingest counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IngestStats {
    /// Complete lines assembled
    pub lines: u32,
    /// Lines whose updates reached the widgets
    pub applied: u32,
    /// Lines that did not decode
    pub rejected: u32,
    /// Lines dropped on lock timeout
    pub skipped: u32,
    /// Overlong or non-UTF-8 lines
    pub malformed: u32,
}

/// Host port receive state
pub struct SensorIngest {
    assembler: LineAssembler,
    decoder: Decoder,
    link: HostLink,
    /// Screen change still owed to the UI
    pending_link: Option<LinkUpdate>,
    stats: IngestStats,
}

impl Default for SensorIngest {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorIngest {
    pub fn new() -> Self {
        Self {
            assembler: LineAssembler::new(),
            decoder: Decoder::new(),
            link: HostLink::new(),
            pending_link: None,
            stats: IngestStats::default(),
        }
    }

    pub fn link(&self) -> &HostLink {
        &self.link
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Screen change waiting for the renderer lock
    pub fn pending_link(&self) -> Option<LinkUpdate> {
        self.pending_link
    }

    /// Host DTR changed
    ///
    /// Returns the byte to send back to the host, if any.
    pub async fn on_dtr<M, R>(
        &mut self,
        asserted: bool,
        lock: &RendererLock<M, R>,
        config: &RenderLoopConfig,
    ) -> Option<BacklightSignal>
    where
        M: RawMutex,
        R: WidgetSink,
    {
        if !asserted {
            self.assembler.reset();
        }
        let update = self.link.on_dtr(asserted);
        self.queue(update);
        self.show_pending(lock, config).await
    }

    /// Backlight switched on or off
    pub fn on_backlight(&mut self, on: bool) -> Option<BacklightSignal> {
        self.link.on_backlight(on)
    }

    /// Process a received chunk
    ///
    /// The first chunk after connecting brings up the dashboard; the
    /// returned signal is the wake byte owed to the host once it shows.
    pub async fn feed<M, R>(
        &mut self,
        bytes: &[u8],
        lock: &RendererLock<M, R>,
        config: &RenderLoopConfig,
    ) -> Option<BacklightSignal>
    where
        M: RawMutex,
        R: WidgetSink,
    {
        if !bytes.is_empty() {
            let update = self.link.on_data();
            self.queue(update);
        }
        let signal = self.show_pending(lock, config).await;

        for &byte in bytes {
            match self.assembler.feed(byte) {
                Ok(Some(line)) => {
                    self.stats.lines += 1;
                    match self.decoder.decode(&line) {
                        Ok(batch) => match apply_batch(lock, &batch, config).await {
                            BatchOutcome::Skipped => self.stats.skipped += 1,
                            BatchOutcome::Empty => {}
                            _ => self.stats.applied += 1,
                        },
                        Err(e) => {
                            self.stats.rejected += 1;
                            debug!("line rejected: {:?}", e);
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    self.stats.malformed += 1;
                    debug!("malformed line: {:?}", e);
                }
            }
        }
        signal
    }

    /// Fold `update` into the owed screen change; later fields win
    fn queue(&mut self, update: LinkUpdate) {
        if update == LinkUpdate::default() {
            return;
        }
        self.pending_link = Some(match self.pending_link.take() {
            Some(older) => LinkUpdate {
                screen: update.screen.or(older.screen),
                loading_text: update.loading_text.or(older.loading_text),
            },
            None => update,
        });
    }

    /// Apply the owed screen change if the lock frees up in time
    async fn show_pending<M, R>(
        &mut self,
        lock: &RendererLock<M, R>,
        config: &RenderLoopConfig,
    ) -> Option<BacklightSignal>
    where
        M: RawMutex,
        R: WidgetSink,
    {
        let update = self.pending_link.take()?;
        let timeout = Duration::from_millis(config.screen_lock_timeout_ms as u64);
        let Some(mut sink) = lock.lock_within(timeout).await else {
            warn!("renderer busy, screen change deferred");
            self.pending_link = Some(update);
            return None;
        };
        if let Some(text) = update.loading_text {
            sink.set_loading_text(text);
        }
        let screen = update.screen?;
        sink.load_screen(screen);
        drop(sink);
        self.link.screen_applied(screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingSink;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use sensorpanel_protocol::link::{TEXT_CONNECTED, TEXT_CONNECTION_LOST};
    use sensorpanel_protocol::{Screen, WidgetId, WidgetUpdate};

    type SinkLock = RendererLock<CriticalSectionRawMutex, RecordingSink>;

    fn id(name: &str) -> WidgetId {
        WidgetId::from_name(name).unwrap()
    }

    #[test]
    fn test_storage_line_updates_label_and_arc() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut ingest = SensorIngest::new();
        block_on(ingest.feed(b"label_storage_2: 63\r\n", &lock, &RenderLoopConfig::default()));

        let sink = lock.try_lock().unwrap();
        assert_eq!(sink.updates.len(), 2);
        assert_eq!(
            sink.updates[1],
            WidgetUpdate::SetValue {
                widget: id("arc_storage_2"),
                value: 63
            }
        );
        assert_eq!(ingest.stats().applied, 1);
    }

    #[test]
    fn test_busy_renderer_skips_update() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut ingest = SensorIngest::new();
        let config = RenderLoopConfig {
            update_lock_timeout_ms: 2,
            follow_up_lock_timeout_ms: 1,
            ..RenderLoopConfig::default()
        };

        // Bring up the dashboard while the lock is free
        block_on(ingest.feed(b"\n", &lock, &config));

        let held = lock.try_lock().unwrap();
        block_on(ingest.feed(b"bar_cpu_usage: 50\n", &lock, &config));
        drop(held);

        assert_eq!(ingest.stats().skipped, 1);
        assert!(lock.try_lock().unwrap().updates.is_empty());
    }

    #[test]
    fn test_empty_batch_needs_no_lock() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut decoder = Decoder::new();
        let batch = decoder.decode("label_storage_1: 12 GB").unwrap();

        let outcome = block_on(async {
            let held = lock.try_lock().unwrap();
            let empty = apply_batch(&lock, &UpdateBatch::default(), &RenderLoopConfig::default()).await;
            drop(held);
            (empty, apply_batch(&lock, &batch, &RenderLoopConfig::default()).await)
        });
        assert_eq!(outcome, (BatchOutcome::Empty, BatchOutcome::Applied));
    }

    #[test]
    fn test_rejected_and_malformed_lines_are_counted() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut ingest = SensorIngest::new();
        let mut long = [b'x'; 200];
        long[199] = b'\n';

        block_on(ingest.feed(b"no separator\nlabel_nope: 1\n", &lock, &RenderLoopConfig::default()));
        block_on(ingest.feed(&long, &lock, &RenderLoopConfig::default()));

        let stats = ingest.stats();
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.applied, 0);
    }

    #[test]
    fn test_connect_shows_dashboard_and_wakes_host() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut ingest = SensorIngest::new();

        let signal = block_on(ingest.on_dtr(true, &lock, &RenderLoopConfig::default()));
        assert_eq!(signal, Some(BacklightSignal::Wake));
        {
            let sink = lock.try_lock().unwrap();
            assert_eq!(sink.screens, [Screen::Dashboard]);
            assert_eq!(sink.loading_text.as_deref(), Some(TEXT_CONNECTED));
        }

        // Dashboard already requested; data does not reload it
        let signal = block_on(ingest.feed(b"label_hostname: nas\n", &lock, &RenderLoopConfig::default()));
        assert_eq!(signal, None);
        assert_eq!(lock.try_lock().unwrap().screens.len(), 1);

        assert_eq!(ingest.on_backlight(false), Some(BacklightSignal::Sleep));
        assert_eq!(ingest.on_backlight(true), Some(BacklightSignal::Wake));
    }

    #[test]
    fn test_disconnect_after_data_reports_lost_connection() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut ingest = SensorIngest::new();
        block_on(ingest.on_dtr(true, &lock, &RenderLoopConfig::default()));
        block_on(ingest.feed(b"label_version: 1.2", &lock, &RenderLoopConfig::default()));

        let signal = block_on(ingest.on_dtr(false, &lock, &RenderLoopConfig::default()));
        assert_eq!(signal, None);
        let sink = lock.try_lock().unwrap();
        assert_eq!(sink.screens, [Screen::Dashboard, Screen::Loading]);
        assert_eq!(sink.loading_text.as_deref(), Some(TEXT_CONNECTION_LOST));
        assert!(!ingest.link().is_port_open());
    }

    #[test]
    fn test_screen_change_retried_after_busy_renderer() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut ingest = SensorIngest::new();
        let config = RenderLoopConfig {
            screen_lock_timeout_ms: 2,
            ..RenderLoopConfig::default()
        };

        let held = lock.try_lock().unwrap();
        let signal = block_on(ingest.on_dtr(true, &lock, &config));
        assert_eq!(signal, None);
        assert_eq!(
            ingest.pending_link(),
            Some(LinkUpdate {
                screen: Some(Screen::Dashboard),
                loading_text: Some(TEXT_CONNECTED),
            })
        );
        assert!(held.screens.is_empty());
        drop(held);

        let signal = block_on(ingest.feed(b"label_hostname: nas\n", &lock, &config));
        assert_eq!(signal, Some(BacklightSignal::Wake));
        assert_eq!(ingest.pending_link(), None);
        let sink = lock.try_lock().unwrap();
        assert_eq!(sink.screens, [Screen::Dashboard]);
        assert_eq!(sink.loading_text.as_deref(), Some(TEXT_CONNECTED));
    }

    #[test]
    fn test_deferred_screen_changes_collapse_to_latest() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut ingest = SensorIngest::new();
        let config = RenderLoopConfig {
            screen_lock_timeout_ms: 2,
            ..RenderLoopConfig::default()
        };

        let held = lock.try_lock().unwrap();
        block_on(ingest.on_dtr(true, &lock, &config));
        block_on(ingest.on_dtr(false, &lock, &config));
        drop(held);

        // Retried with an empty chunk; only the final screen is loaded
        let signal = block_on(ingest.feed(b"", &lock, &config));
        assert_eq!(signal, None);
        let sink = lock.try_lock().unwrap();
        assert_eq!(sink.screens, [Screen::Loading]);
        assert_eq!(sink.loading_text.as_deref(), Some(TEXT_CONNECTED));
    }

    #[test]
    fn test_data_without_dtr_brings_up_dashboard_silently() {
        let lock = SinkLock::new(RecordingSink::default());
        let mut ingest = SensorIngest::new();
        let signal = block_on(ingest.feed(b"label_account: admin\n", &lock, &RenderLoopConfig::default()));

        // Port never opened, so no wake byte
        assert_eq!(signal, None);
        assert_eq!(lock.try_lock().unwrap().screens, [Screen::Dashboard]);
        assert_eq!(ingest.decoder().account(), Some("admin"));
    }
}
