//! Application state, the audio stream, and the event loop.

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use cpal::traits::{DeviceTrait, StreamTrait};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use roomtone::effects::{DelayParams, EffectKind, EffectParams, LofiParams, ReverbParams};
use roomtone::eq::{BAND_COUNT, EQ_PRESETS};
use roomtone::{MixEngine, SourceRegistry, MAX_BLOCK_SIZE};

use crate::ui;

pub struct App {
    pub registry: SourceRegistry,
    /// Load-ordered ids for stable display and selection.
    pub ids: Vec<String>,
    pub selected: usize,
    /// EQ band the -/= keys edit.
    pub band: usize,
    should_quit: bool,
}

impl App {
    pub fn new(registry: SourceRegistry) -> Self {
        let mut ids: Vec<String> =
            registry.sound_ids().map(str::to_owned).collect();
        ids.sort();

        Self {
            registry,
            ids,
            selected: 0,
            band: 0,
            should_quit: false,
        }
    }

    /// Start audio, take over the terminal, run until quit.
    pub fn run(
        mut self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        engine: MixEngine,
    ) -> EyreResult<()> {
        let stream = build_stream(device, config, engine)?;
        stream.play()?;

        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal);
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(33))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    fn selected_id(&self) -> Option<String> {
        self.ids.get(self.selected).cloned()
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,

            KeyCode::Down | KeyCode::Char('j') => {
                if !self.ids.is_empty() {
                    self.selected = (self.selected + 1) % self.ids.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !self.ids.is_empty() {
                    self.selected = (self.selected + self.ids.len() - 1) % self.ids.len();
                }
            }

            KeyCode::Left | KeyCode::Char('h') => self.nudge_volume(-0.05),
            KeyCode::Right | KeyCode::Char('l') => self.nudge_volume(0.05),

            KeyCode::Char('w') => self.nudge_position(0.0, -0.1),
            KeyCode::Char('s') => self.nudge_position(0.0, 0.1),
            KeyCode::Char('a') => self.nudge_position(-0.1, 0.0),
            KeyCode::Char('d') => self.nudge_position(0.1, 0.0),

            KeyCode::Char('m') => {
                if let Some(id) = self.selected_id() {
                    let muted = self.registry.is_muted(&id).unwrap_or(false);
                    self.registry.set_mute(&id, !muted);
                }
            }

            KeyCode::Tab => self.band = (self.band + 1) % BAND_COUNT,
            KeyCode::Char('-') => self.nudge_band_gain(-1.0),
            KeyCode::Char('=') => self.nudge_band_gain(1.0),

            // Number keys apply the built-in EQ presets.
            KeyCode::Char(c @ '1'..='6') => {
                if let Some(id) = self.selected_id() {
                    let index = c as usize - '1' as usize;
                    self.registry.apply_eq_preset(&id, EQ_PRESETS[index].gains);
                }
            }

            KeyCode::Char('r') => self.toggle_effect(EffectKind::Reverb),
            KeyCode::Char('e') => self.toggle_effect(EffectKind::Delay),
            KeyCode::Char('f') => self.toggle_effect(EffectKind::Lofi),

            _ => {}
        }
    }

    fn nudge_volume(&mut self, delta: f32) {
        if let Some(id) = self.selected_id() {
            if let Some(volume) = self.registry.get_sound_volume(&id) {
                self.registry.set_sound_volume(&id, volume + delta);
            }
        }
    }

    fn nudge_position(&mut self, dx: f32, dy: f32) {
        if let Some(id) = self.selected_id() {
            if let Some((x, y)) = self.registry.get_sound_position(&id) {
                let r = self.registry.room_half_extent();
                self.registry.set_sound_position(&id, x + dx * r, y + dy * r);
            }
        }
    }

    fn nudge_band_gain(&mut self, delta: f32) {
        if let Some(id) = self.selected_id() {
            if let Some(bands) = self.registry.get_sound_eq(&id) {
                let gain = bands[self.band].gain_db + delta;
                self.registry.set_eq_band(&id, self.band, gain);
            }
        }
    }

    fn toggle_effect(&mut self, kind: EffectKind) {
        let enable = !self.registry.is_effect_enabled(kind);
        if enable {
            // Push current defaults alongside the enable so a fresh
            // session starts from sensible settings.
            let params = match kind {
                EffectKind::Reverb => EffectParams::Reverb(ReverbParams::default()),
                EffectKind::Delay => EffectParams::Delay(DelayParams::default()),
                EffectKind::Lofi => EffectParams::Lofi(LofiParams::default()),
            };
            self.registry.set_effect(true, params);
        } else {
            self.registry.set_effect_enabled(kind, false);
        }
    }
}

/// Build the output stream; the engine moves into the audio callback and
/// its mono mix is fanned out to every device channel.
fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: MixEngine,
) -> EyreResult<cpal::Stream> {
    let channels = config.channels as usize;
    let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _| {
            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let block = &mut mono[..frames];
                engine.render_block(block);

                let offset = frames_written * channels;
                for (i, &sample) in block.iter().enumerate() {
                    for channel in 0..channels {
                        data[offset + i * channels + channel] = sample;
                    }
                }

                frames_written += frames;
            }
        },
        |err| log::error!("audio stream error: {err}"),
        None,
    )?;

    Ok(stream)
}
