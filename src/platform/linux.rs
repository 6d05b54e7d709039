use super::{ActiveWindow, PlatformDisplay};
use log::warn;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ClientMessageEvent, ConnectionExt, EventMask, Window};

pub struct LinuxDisplay {
    conn: Option<x11rb::rust_connection::RustConnection>,
    root: Window,
}

impl Default for LinuxDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxDisplay {
    pub fn new() -> Self {
        match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let Some(root) = conn.setup().roots.get(screen_num).map(|s| s.root) else {
                    warn!(
                        "Invalid screen number {screen_num} ({} screens available). Foreground tracking disabled.",
                        conn.setup().roots.len()
                    );
                    return Self { conn: None, root: 0 };
                };
                Self {
                    conn: Some(conn),
                    root,
                }
            }
            Err(e) => {
                // Wayland or headless: keep running, report nothing
                warn!("Failed to connect to X server: {e}. Foreground tracking disabled.");
                Self { conn: None, root: 0 }
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn get_atom(&self, name: &str) -> Option<u32> {
        self.conn
            .as_ref()?
            .intern_atom(false, name.as_bytes())
            .ok()?
            .reply()
            .ok()
            .map(|r| r.atom)
    }

    fn get_window_property(&self, window: Window, atom: u32) -> Option<String> {
        let reply = self
            .conn
            .as_ref()?
            .get_property(false, window, atom, AtomEnum::ANY, 0, 1024)
            .ok()?
            .reply()
            .ok()?;

        if reply.value.is_empty() {
            return None;
        }

        String::from_utf8(reply.value).ok()
    }

    fn get_active_window_id(&self) -> Option<Window> {
        let conn = self.conn.as_ref()?;
        let atom = self.get_atom("_NET_ACTIVE_WINDOW")?;
        let reply = conn
            .get_property(false, self.root, atom, AtomEnum::WINDOW, 0, 1)
            .ok()?
            .reply()
            .ok()?;

        let first = reply.value32()?.next();
        first.filter(|&w| w != 0)
    }
}

/// First WM_CLASS component (the instance name), e.g. "firefox".
fn parse_wm_class(raw: &str) -> Option<String> {
    raw.split('\0')
        .find(|part| !part.is_empty())
        .map(str::to_string)
}

impl PlatformDisplay for LinuxDisplay {
    fn get_active_window(&self) -> Option<ActiveWindow> {
        let window_id = self.get_active_window_id()?;

        let app_id = self
            .get_window_property(window_id, AtomEnum::WM_CLASS.into())
            .and_then(|s| parse_wm_class(&s))?;

        Some(ActiveWindow { app_id })
    }

    fn show_desktop(&self) -> bool {
        let Some(conn) = self.conn.as_ref() else {
            return false;
        };
        let Some(atom) = self.get_atom("_NET_SHOWING_DESKTOP") else {
            return false;
        };

        let event = ClientMessageEvent::new(32, self.root, atom, [1u32, 0, 0, 0, 0]);
        let sent = conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        );

        match sent.and_then(|_| conn.flush()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to request desktop: {e}");
                false
            }
        }
    }
}
