//! GTK tray icon bound to controller [`Action`]s.
//!
//! `TrayIcon` and the menu items are `!Send`, so they live on a dedicated GTK
//! thread. User input flows out as `Action`s; the controller pushes
//! [`TrayUpdate`]s back, drained by a glib timeout on the same thread.

use anyhow::{Context, Result};
use gtk::glib;
use gtk::prelude::*;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};
use tray_icon::menu::{CheckMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem, Submenu};
use tray_icon::{Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};

use crate::controller::{Action, TrayView, APP_NAME};
use crate::settings::{CaptureArea, Framerate};

pub enum TrayUpdate {
    Refresh(TrayView),
    About(String),
    Quit,
}

pub fn spawn(
    actions: UnboundedSender<Action>,
    updates: Receiver<TrayUpdate>,
    initial: TrayView,
) -> Result<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("tray".to_string())
        .spawn(move || {
            if let Err(e) = run(actions.clone(), updates, initial) {
                error!("tray failed: {:#}", e);
                let _ = actions.send(Action::Quit);
            }
        })
        .context("failed to spawn tray thread")?;
    Ok(handle)
}

fn run(actions: UnboundedSender<Action>, updates: Receiver<TrayUpdate>, initial: TrayView) -> Result<()> {
    gtk::init().context("failed to initialize GTK")?;

    let menu = TrayMenu::build(&initial)?;
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(menu.menu.clone()))
        .with_tooltip(&initial.tooltip)
        .with_icon(glyph(initial.recording)?)
        .build()
        .context("failed to create tray icon")?;

    forward_events(actions);

    let mut shown = initial;
    glib::timeout_add_local(Duration::from_millis(100), move || loop {
        match updates.try_recv() {
            Ok(TrayUpdate::Refresh(view)) => {
                apply(&tray, &menu, &shown, &view);
                shown = view;
            }
            Ok(TrayUpdate::About(text)) => show_about(&text),
            Ok(TrayUpdate::Quit) | Err(TryRecvError::Disconnected) => {
                gtk::main_quit();
                return glib::ControlFlow::Break;
            }
            Err(TryRecvError::Empty) => return glib::ControlFlow::Continue,
        }
    });

    info!("tray ready");
    gtk::main();
    info!("tray closed");
    Ok(())
}

fn forward_events(actions: UnboundedSender<Action>) {
    let menu_tx = actions.clone();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        match action_for(event.id.as_ref()) {
            Some(action) => {
                let _ = menu_tx.send(action);
            }
            None => warn!("unknown menu item {:?}", event.id),
        }
    }));

    // AppIndicator does not report clicks, so this only fires on trays that do.
    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        if let TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state: MouseButtonState::Up,
            ..
        } = event
        {
            let _ = actions.send(Action::Trigger);
        }
    }));
}

fn apply(tray: &TrayIcon, menu: &TrayMenu, shown: &TrayView, view: &TrayView) {
    if let Err(e) = tray.set_tooltip(Some(&view.tooltip)) {
        warn!("failed to update tooltip: {}", e);
    }

    if shown.recording != view.recording {
        match glyph(view.recording) {
            Ok(icon) => {
                if let Err(e) = tray.set_icon(Some(icon)) {
                    warn!("failed to update tray icon: {}", e);
                }
            }
            Err(e) => warn!("{:#}", e),
        }
    }

    // muda flips a check item on click; re-assert the single selection
    menu.sync(view);
}

struct TrayMenu {
    menu: Menu,
    areas: Vec<(CaptureArea, CheckMenuItem)>,
    framerates: Vec<(Framerate, CheckMenuItem)>,
    sound: CheckMenuItem,
    start: MenuItem,
    stop: MenuItem,
}

impl TrayMenu {
    fn build(view: &TrayView) -> Result<Self> {
        let area_menu = Submenu::new("Area", true);
        let areas: Vec<_> = CaptureArea::ALL
            .into_iter()
            .map(|area| {
                let checked = view.settings.area == area;
                (area, CheckMenuItem::with_id(area_id(area), area.label(), true, checked, None))
            })
            .collect();
        for (_, item) in &areas {
            area_menu.append(item)?;
        }

        let framerate_menu = Submenu::new("Framerate", true);
        let framerates: Vec<_> = Framerate::ALL
            .into_iter()
            .map(|framerate| {
                let checked = view.settings.framerate == framerate;
                let label = format!("{} FPS", framerate);
                (
                    framerate,
                    CheckMenuItem::with_id(framerate_id(framerate), label, true, checked, None),
                )
            })
            .collect();
        for (_, item) in &framerates {
            framerate_menu.append(item)?;
        }

        let sound = CheckMenuItem::with_id(SOUND_ID, "With Sound", true, view.settings.with_sound, None);
        let start = MenuItem::with_id(START_ID, "Start Recording", !view.recording, None);
        let stop = MenuItem::with_id(STOP_ID, "Stop Recording", view.recording, None);
        let about = MenuItem::with_id(ABOUT_ID, "About", true, None);
        let quit = MenuItem::with_id(QUIT_ID, "Quit", true, None);

        let menu = Menu::new();
        menu.append_items(&[
            &area_menu,
            &framerate_menu,
            &sound,
            &PredefinedMenuItem::separator(),
            &start,
            &stop,
            &PredefinedMenuItem::separator(),
            &about,
            &quit,
        ])?;

        Ok(Self {
            menu,
            areas,
            framerates,
            sound,
            start,
            stop,
        })
    }

    fn sync(&self, view: &TrayView) {
        for (area, item) in &self.areas {
            item.set_checked(*area == view.settings.area);
        }
        for (framerate, item) in &self.framerates {
            item.set_checked(*framerate == view.settings.framerate);
        }
        self.sound.set_checked(view.settings.with_sound);
        self.start.set_enabled(!view.recording);
        self.stop.set_enabled(view.recording);
    }
}

const SOUND_ID: &str = "sound";
const START_ID: &str = "start";
const STOP_ID: &str = "stop";
const ABOUT_ID: &str = "about";
const QUIT_ID: &str = "quit";

fn area_id(area: CaptureArea) -> &'static str {
    match area {
        CaptureArea::FullScreen => "area.full_screen",
        CaptureArea::ActiveWindow => "area.active_window",
    }
}

fn framerate_id(framerate: Framerate) -> String {
    format!("framerate.{}", framerate.fps())
}

fn action_for(id: &str) -> Option<Action> {
    if let Some(area) = CaptureArea::ALL.into_iter().find(|a| area_id(*a) == id) {
        return Some(Action::SelectArea(area));
    }
    if let Some(framerate) = Framerate::ALL.into_iter().find(|f| framerate_id(*f) == id) {
        return Some(Action::SelectFramerate(framerate));
    }

    match id {
        SOUND_ID => Some(Action::ToggleSound),
        START_ID => Some(Action::Start),
        STOP_ID => Some(Action::Stop),
        ABOUT_ID => Some(Action::ShowInfo),
        QUIT_ID => Some(Action::Quit),
        _ => None,
    }
}

/// Red dot while idle, red square while recording.
fn glyph(recording: bool) -> Result<Icon> {
    const SIZE: u32 = 32;
    let center = (SIZE as f32 - 1.0) / 2.0;

    let mut rgba = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let inside = if recording {
                (8..24).contains(&x) && (8..24).contains(&y)
            } else {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                dx * dx + dy * dy <= 11.0 * 11.0
            };

            if inside {
                rgba.extend_from_slice(&[220, 40, 40, 255]);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }

    Icon::from_rgba(rgba, SIZE, SIZE).context("failed to build tray icon image")
}

fn show_about(text: &str) {
    let dialog = gtk::MessageDialog::new(
        None::<&gtk::Window>,
        gtk::DialogFlags::empty(),
        gtk::MessageType::Info,
        gtk::ButtonsType::Close,
        APP_NAME,
    );
    dialog.set_secondary_text(Some(text));
    dialog.connect_response(|dialog, _| dialog.close());
    dialog.show_all();
}
