//! Kernel event-device backend.
//!
//! Scans `/dev/input/event*`, deduces each node's device type from its
//! capability bitmaps, and streams `input_event` packets into portable
//! readings. Reading groups follow the kernel's `SYN_REPORT` framing;
//! `SYN_DROPPED` becomes the overrun sentinel and the whole-device state
//! query goes through `EVIOCGKEY`/`EVIOCGABS`. Force feedback uploads
//! `ff_effect` objects via `EVIOCSFF` and drives them with `EV_FF` writes.
//!
//! Users must be able to read (and, for force feedback, write) the event
//! nodes; a permission failure during enumeration is surfaced as a hard
//! [`Error::AccessDenied`] with the offending path, since a silently empty
//! device list is the least debuggable failure mode this library has.

pub(crate) mod codemap;
pub(crate) mod identity;
pub(crate) mod sys;

use std::collections::HashMap;
use std::fs;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::backend::{
    AbsAxis, Backend, Capabilities, DeviceIo, Discovered, EffectHandle, GamepadItem, HardwareId,
    KeyboardReading, MotorCaps, MouseReading, PollEvent, Reading, ReadingInput, StateSnapshot,
};
use crate::codes::{Button, DeviceKind, Key, KeySet, NUM_BUTTONS};
use crate::error::{Error, IoFailure};
use crate::force::{ForceKind, ForceKindSet, ForceParams, ForceStatus};
use crate::metadata::DeviceMeta;
use crate::state::Timestamp;

const DEV_INPUT: &str = "/dev/input";

/// Low-resolution wheel detents are scaled to match high-resolution wheel
/// units (120 per detent).
const WHEEL_DETENT: i64 = 120;

const NUM_MOUSE_BUTTONS: u32 = 8;
const NUM_THUMBSTICKS: u32 = 2;

fn now_micros() -> Timestamp {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } == 0 {
        ts.tv_sec as Timestamp * 1_000_000 + (ts.tv_nsec / 1_000) as Timestamp
    } else {
        0
    }
}

/// `/dev/input/event*` nodes with their numeric index.
fn event_files() -> Result<Vec<(PathBuf, u32)>, Error> {
    let entries = fs::read_dir(DEV_INPUT)
        .map_err(|e| Error::BackendInit(format!("cannot enumerate {DEV_INPUT}: {e}")))?;

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(suffix) = name.strip_prefix("event") else { continue };
        let Ok(index) = suffix.parse::<u32>() else { continue };
        files.push((entry.path(), index));
    }
    files.sort_by_key(|&(_, index)| index);
    Ok(files)
}

fn open_node(path: &Path, flags: libc::c_int) -> Result<OwnedFd, i32> {
    use std::os::unix::ffi::OsStrExt;
    let cpath = std::ffi::CString::new(path.as_os_str().as_bytes()).map_err(|_| libc::EINVAL)?;
    let fd = unsafe { libc::open(cpath.as_ptr(), flags | libc::O_NONBLOCK | libc::O_CLOEXEC) };
    if fd < 0 {
        Err(std::io::Error::last_os_error().raw_os_error().unwrap_or(0))
    } else {
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }
}

/// Weighted-evidence device type deduction over the EV and KEY capability
/// bitmaps. A device is accepted only when the winning type's net evidence
/// exceeds 1.
fn deduce_kind(fd: RawFd) -> Option<DeviceKind> {
    let mut ev_bits = [0u8; (sys::EV_CNT - 1) / 8 + 1];
    let mut key_bits = [0u8; (sys::KEY_CNT - 1) / 8 + 1];
    unsafe {
        sys::ioctl(fd, sys::eviocgbit(0, ev_bits.len()), ev_bits.as_mut_ptr());
        sys::ioctl(fd, sys::eviocgbit(sys::EV_KEY, key_bits.len()), key_bits.as_mut_ptr());
    }

    // SYN_REPORT framing is required to form reading groups at all
    if ev_bits.iter().all(|&b| b == 0) || !sys::get_bit(&ev_bits, sys::EV_SYN) {
        return None;
    }

    let mut mouse = 0i32;
    let mut keyboard = 0i32;
    let mut gamepad = 0i32;

    if sys::get_bit(&ev_bits, sys::EV_REL) {
        // only mice generate relative events
        mouse += 1;
        keyboard -= 1;
        gamepad -= 1;
    }
    if sys::get_bit(&ev_bits, sys::EV_ABS) {
        // absolute events point at gamepads; touchscreens are caught by the
        // BTN_TOUCH blacklist below
        gamepad += 1;
        mouse -= 1;
        keyboard -= 1;
    }
    if sys::get_bit(&ev_bits, sys::EV_FF) {
        gamepad += 1;
    }

    let mut kc_mouse = 0i32;
    let mut kc_keyboard = 0i32;
    let mut kc_gamepad = 0i32;
    for key in Key::all() {
        kc_keyboard += sys::get_bit(&key_bits, codemap::key_to_code(key)) as i32;
    }
    for button in Button::all() {
        kc_gamepad += sys::get_bit(&key_bits, codemap::button_to_code(button)) as i32;
    }
    for &code in &codemap::MOUSE_RECOG {
        kc_mouse += sys::get_bit(&key_bits, code) as i32;
    }
    for &code in &codemap::AVOID_RECOG {
        if sys::get_bit(&key_bits, code) {
            mouse -= 1;
            keyboard -= 1;
            gamepad -= 1;
        }
    }

    if kc_mouse > 0 && kc_keyboard + kc_gamepad <= 0 {
        mouse += 2;
        keyboard -= 1;
        gamepad -= 1;
    } else if kc_keyboard > 0 && kc_gamepad <= 0 {
        // keyboards have little other evidence, so their keycodes weigh more
        keyboard += 3;
        mouse -= 1;
        gamepad -= 1;
    } else if kc_gamepad > 0 {
        gamepad += 2;
        mouse -= 1;
        keyboard -= 1;
    }

    let (kind, proof) = if mouse > keyboard && mouse > gamepad {
        (DeviceKind::Mouse, mouse)
    } else if keyboard > gamepad {
        (DeviceKind::Keyboard, keyboard)
    } else {
        (DeviceKind::Gamepad, gamepad)
    };

    (proof > 1).then_some(kind)
}

fn probe_abs(fd: RawFd, code: u16) -> Option<sys::input_absinfo> {
    let mut info = sys::input_absinfo::default();
    unsafe { sys::ioctl(fd, sys::eviocgabs(code), &mut info) }.then_some(info)
}

fn query_capabilities(fd: RawFd, kind: DeviceKind) -> Capabilities {
    let mut caps = Capabilities::default();

    match kind {
        DeviceKind::Mouse => caps.mouse_buttons = NUM_MOUSE_BUTTONS,
        DeviceKind::Keyboard => {}
        DeviceKind::Gamepad => {
            caps.thumbsticks = NUM_THUMBSTICKS;

            let mut abs_bits = [0u8; 8];
            unsafe { sys::ioctl(fd, sys::eviocgbit(sys::EV_ABS, abs_bits.len()), abs_bits.as_mut_ptr()) };
            for axis in [
                AbsAxis::LeftX,
                AbsAxis::LeftY,
                AbsAxis::RightX,
                AbsAxis::RightY,
                AbsAxis::HatX,
                AbsAxis::HatY,
                AbsAxis::TriggerL1,
                AbsAxis::TriggerR1,
                AbsAxis::TriggerL2,
                AbsAxis::TriggerR2,
            ] {
                let code = codemap::abs_code(axis);
                if !sys::get_bit(&abs_bits, code) {
                    continue;
                }
                if let Some(info) = probe_abs(fd, code) {
                    caps.axis_ranges.push((axis, info.minimum, info.maximum));
                }
            }
        }
    }

    // force capabilities; any supported kind exposes a single motor
    let mut ff_bits = [0u8; (sys::FF_CNT - 1) / 8 + 1];
    unsafe { sys::ioctl(fd, sys::eviocgbit(sys::EV_FF, ff_bits.len()), ff_bits.as_mut_ptr()) };

    let mut kinds = ForceKindSet::EMPTY;
    // FF_RUMBLE feeds both bits here, matching the capability table this
    // backend has always shipped with
    if sys::get_bit(&ff_bits, sys::FF_RUMBLE) {
        kinds.insert(ForceKind::Rumble);
        kinds.insert(ForceKind::Constant);
    }
    if sys::get_bit(&ff_bits, sys::FF_RAMP) {
        kinds.insert(ForceKind::Ramp);
    }
    if sys::get_bit(&ff_bits, sys::FF_PERIODIC) {
        kinds.insert(ForceKind::Sine);
        kinds.insert(ForceKind::Triangle);
        kinds.insert(ForceKind::Square);
        kinds.insert(ForceKind::SawUp);
        kinds.insert(ForceKind::SawDown);
    }
    if sys::get_bit(&ff_bits, sys::FF_SPRING) {
        kinds.insert(ForceKind::Spring);
    }
    if sys::get_bit(&ff_bits, sys::FF_FRICTION) {
        kinds.insert(ForceKind::Friction);
    }
    if sys::get_bit(&ff_bits, sys::FF_DAMPER) {
        kinds.insert(ForceKind::Damper);
    }
    if sys::get_bit(&ff_bits, sys::FF_INERTIA) {
        kinds.insert(ForceKind::Inertia);
    }

    if !kinds.is_empty() {
        caps.motors.push(MotorCaps { kinds });
    }
    caps.supports_gain = sys::get_bit(&ff_bits, sys::FF_GAIN);
    caps.supports_autocenter = sys::get_bit(&ff_bits, sys::FF_AUTOCENTER);
    caps
}

fn bus_name(bustype: u16) -> Option<&'static str> {
    Some(match bustype {
        0x01 => "pci",
        0x03 => "usb",
        0x05 => "bluetooth",
        0x06 => "virtual",
        0x11 => "i8042",
        0x19 => "host",
        _ => return None,
    })
}

fn query_metadata(fd: RawFd, path: &Path) -> DeviceMeta {
    let mut id = sys::input_id::default();
    let have_id = unsafe { sys::ioctl(fd, sys::eviocgid(), &mut id) };

    let read_string = |request: libc::c_ulong| {
        let mut buf = [0u8; 256];
        let ok = unsafe { sys::ioctl(fd, request, buf.as_mut_ptr()) };
        ok.then(|| {
            let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            String::from_utf8_lossy(&buf[..len]).into_owned()
        })
        .filter(|s| !s.is_empty())
    };

    DeviceMeta {
        bus: have_id.then(|| bus_name(id.bustype)).flatten().map(str::to_owned),
        vendor_id: have_id.then_some(id.vendor),
        product_id: have_id.then_some(id.product),
        version: have_id.then_some(id.version),
        product_string: read_string(sys::eviocgname(255)),
        physical_location: read_string(sys::eviocgphys(255)),
        path: Some(path.display().to_string()),
    }
}

/// Backend over the kernel event-device tree.
#[derive(Default)]
pub struct EvdevBackend {
    _priv: (),
}

impl EvdevBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for EvdevBackend {
    fn name(&self) -> &str {
        "evdev"
    }

    fn discover(&mut self) -> Result<Vec<Discovered>, Error> {
        let mut found = Vec::new();
        for (path, index) in event_files()? {
            let fd = match open_node(&path, libc::O_RDONLY) {
                Ok(fd) => fd,
                Err(errno) if errno == libc::EACCES || errno == libc::EPERM => {
                    return Err(Error::AccessDenied { path });
                }
                Err(_) => continue,
            };

            let Some(kind) = deduce_kind(fd.as_raw_fd()) else { continue };
            let hardware = identity::hardware_id(fd.as_raw_fd(), index);
            debug!("evdev: {} is a {kind:?} ({hardware})", path.display());
            found.push(Discovered { hardware, kind });
        }
        Ok(found)
    }

    fn open(&mut self, hardware: &HardwareId, kind: DeviceKind) -> Option<Box<dyn DeviceIo>> {
        let files = event_files().ok()?;
        for (path, index) in files {
            let fd = match open_node(&path, libc::O_RDWR) {
                Ok(fd) => fd,
                Err(errno) => {
                    if errno == libc::EACCES || errno == libc::EPERM {
                        warn!("evdev: no write access to {}", path.display());
                    }
                    continue;
                }
            };

            if identity::hardware_id(fd.as_raw_fd(), index) != *hardware
                || deduce_kind(fd.as_raw_fd()) != Some(kind)
            {
                continue;
            }

            // readings must share the library clock
            let mut clock: libc::c_int = libc::CLOCK_REALTIME;
            if !unsafe { sys::ioctl(fd.as_raw_fd(), sys::eviocsclockid(), &mut clock) } {
                continue;
            }

            let caps = query_capabilities(fd.as_raw_fd(), kind);
            let meta = query_metadata(fd.as_raw_fd(), &path);
            return Some(Box::new(EvdevIo {
                fd,
                kind,
                caps,
                meta,
                group: GroupState::default(),
                mouse: MouseMirror::default(),
                keys: KeySet::EMPTY,
                effect_status: HashMap::new(),
                effect_count: 0,
            }));
        }
        None
    }
}

/// Per-group accumulation, reset at every `SYN_REPORT`/`SYN_DROPPED`.
#[derive(Debug, Default)]
struct GroupState {
    any: bool,
    dx: i64,
    dy: i64,
    sdx: i64,
    sdy: i64,
    hr_sdx: i64,
    hr_sdy: i64,
    items: Vec<GamepadItem>,
}

impl GroupState {
    fn reset(&mut self) {
        self.any = false;
        self.dx = 0;
        self.dy = 0;
        self.sdx = 0;
        self.sdy = 0;
        self.hr_sdx = 0;
        self.hr_sdy = 0;
        self.items.clear();
    }
}

/// Relative motion folded into the monotonic counters a reading reports.
#[derive(Debug, Default)]
struct MouseMirror {
    x: i64,
    y: i64,
    sx: i64,
    sy: i64,
    buttons: u32,
}

struct EvdevIo {
    fd: OwnedFd,
    kind: DeviceKind,
    caps: Capabilities,
    meta: DeviceMeta,
    group: GroupState,
    mouse: MouseMirror,
    keys: KeySet,
    effect_status: HashMap<u16, ForceStatus>,
    effect_count: usize,
}

impl EvdevIo {
    fn handle_event(&mut self, ev: &sys::input_event, since: Timestamp, out: &mut Vec<PollEvent>) {
        match ev.type_ {
            sys::EV_SYN => match ev.code {
                sys::SYN_DROPPED => {
                    // the partial group died with the kernel buffer
                    self.group.reset();
                    out.push(PollEvent::Overrun { timestamp: sys::event_timestamp(ev) });
                }
                sys::SYN_REPORT => self.finalize_group(sys::event_timestamp(ev), since, out),
                _ => {}
            },
            sys::EV_FF_STATUS => {
                let status = match ev.value {
                    sys::FF_STATUS_STOPPED => ForceStatus::Inactive,
                    sys::FF_STATUS_PLAYING => ForceStatus::Active,
                    _ => ForceStatus::Unknown,
                };
                self.effect_status.insert(ev.code, status);
            }
            sys::EV_REL if self.kind == DeviceKind::Mouse => {
                let value = ev.value as i64;
                match ev.code {
                    sys::REL_X => self.group.dx += value,
                    sys::REL_Y => self.group.dy += value,
                    sys::REL_HWHEEL => self.group.sdx += value,
                    sys::REL_WHEEL => self.group.sdy += value,
                    sys::REL_HWHEEL_HI_RES => self.group.hr_sdx += value,
                    sys::REL_WHEEL_HI_RES => self.group.hr_sdy += value,
                    _ => return,
                }
                self.group.any = true;
            }
            sys::EV_KEY => match self.kind {
                DeviceKind::Mouse => {
                    if (sys::BTN_LEFT..=sys::BTN_TASK).contains(&ev.code) {
                        let bit = 1 << (ev.code - sys::BTN_LEFT);
                        if ev.value != 0 {
                            self.mouse.buttons |= bit;
                        } else {
                            self.mouse.buttons &= !bit;
                        }
                        self.group.any = true;
                    }
                }
                DeviceKind::Keyboard => {
                    if let Some(key) = codemap::key_from_code(ev.code) {
                        if ev.value != 0 {
                            self.keys.insert(key);
                        } else {
                            self.keys.remove(key);
                        }
                        self.group.any = true;
                    }
                }
                DeviceKind::Gamepad => {
                    if let Some(button) = codemap::button_from_code(ev.code) {
                        self.group.items.push(GamepadItem::Button { button, pressed: ev.value != 0 });
                        self.group.any = true;
                    }
                }
            },
            sys::EV_ABS if self.kind == DeviceKind::Gamepad => {
                if let Some(axis) = codemap::axis_from_abs(ev.code) {
                    self.group.items.push(GamepadItem::Axis { axis, raw: ev.value });
                    self.group.any = true;
                }
            }
            _ => {}
        }
    }

    fn finalize_group(&mut self, ts: Timestamp, since: Timestamp, out: &mut Vec<PollEvent>) {
        if !self.group.any {
            self.group.reset();
            return;
        }

        let input = match self.kind {
            DeviceKind::Mouse => {
                // a group with any hi-res wheel data supersedes the low-res
                // detents, which would double-report the same motion
                let (sdx, sdy) = if self.group.hr_sdx != 0 || self.group.hr_sdy != 0 {
                    (self.group.hr_sdx, self.group.hr_sdy)
                } else {
                    (self.group.sdx * WHEEL_DETENT, self.group.sdy * WHEEL_DETENT)
                };
                self.mouse.x += self.group.dx;
                self.mouse.y += self.group.dy;
                self.mouse.sx += sdx;
                self.mouse.sy += sdy;
                ReadingInput::Mouse(MouseReading {
                    x: self.mouse.x,
                    y: self.mouse.y,
                    scroll_x: self.mouse.sx,
                    scroll_y: self.mouse.sy,
                    buttons: self.mouse.buttons,
                })
            }
            DeviceKind::Keyboard => ReadingInput::Keyboard(KeyboardReading { keys: self.keys }),
            DeviceKind::Gamepad => ReadingInput::Gamepad(crate::backend::GamepadReading {
                items: std::mem::take(&mut self.group.items),
            }),
        };

        if ts >= since {
            out.push(PollEvent::Reading(Reading { timestamp: ts, input }));
        }
        self.group.reset();
    }

    fn write_event(&mut self, type_: u16, code: u16, value: i32) -> bool {
        let ev = sys::input_event {
            time: libc::timeval { tv_sec: 0, tv_usec: 0 },
            type_,
            code,
            value,
        };
        let n = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                &ev as *const _ as *const libc::c_void,
                std::mem::size_of::<sys::input_event>(),
            )
        };
        n >= 0
    }
}

impl DeviceIo for EvdevIo {
    fn connected(&self) -> bool {
        // liveness shows up as read errors; the handle itself stays valid
        true
    }

    fn display_name(&self) -> Option<String> {
        let mut buf = [0u8; 256];
        let ok = unsafe { sys::ioctl(self.fd.as_raw_fd(), sys::eviocgname(255), buf.as_mut_ptr()) };
        ok.then(|| {
            let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            String::from_utf8_lossy(&buf[..len]).into_owned()
        })
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn metadata(&self) -> DeviceMeta {
        self.meta.clone()
    }

    fn now(&self) -> Timestamp {
        now_micros()
    }

    fn poll(&mut self, since: Timestamp, out: &mut Vec<PollEvent>) -> Result<(), IoFailure> {
        loop {
            let mut ev = sys::input_event {
                time: libc::timeval { tv_sec: 0, tv_usec: 0 },
                type_: 0,
                code: 0,
                value: 0,
            };
            let n = unsafe {
                libc::read(
                    self.fd.as_raw_fd(),
                    &mut ev as *mut _ as *mut libc::c_void,
                    std::mem::size_of::<sys::input_event>(),
                )
            };

            if n == std::mem::size_of::<sys::input_event>() as isize {
                self.handle_event(&ev, since, out);
                continue;
            }
            if n < 0 {
                let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
                return match errno {
                    libc::EAGAIN => Ok(()),
                    libc::ENODEV => Err(IoFailure::Fatal),
                    _ => Err(IoFailure::Transient),
                };
            }
            // short read; nothing more to drain
            return Ok(());
        }
    }

    fn snapshot(&mut self) -> Result<StateSnapshot, IoFailure> {
        let mut key_bits = [0u8; (sys::KEY_CNT - 1) / 8 + 1];
        if !unsafe { sys::ioctl(self.fd.as_raw_fd(), sys::eviocgkey(key_bits.len()), key_bits.as_mut_ptr()) } {
            return Err(IoFailure::Transient);
        }

        Ok(match self.kind {
            DeviceKind::Mouse => {
                let mut buttons = 0u32;
                for bit in 0..NUM_MOUSE_BUTTONS {
                    if sys::get_bit(&key_bits, sys::BTN_LEFT + bit as u16) {
                        buttons |= 1 << bit;
                    }
                }
                self.mouse.buttons = buttons;
                StateSnapshot::Mouse { buttons }
            }
            DeviceKind::Keyboard => {
                let mut keys = KeySet::EMPTY;
                for key in Key::all() {
                    if sys::get_bit(&key_bits, codemap::key_to_code(key)) {
                        keys.insert(key);
                    }
                }
                self.keys = keys;
                StateSnapshot::Keyboard { keys }
            }
            DeviceKind::Gamepad => {
                let mut buttons = [false; NUM_BUTTONS];
                for button in Button::all() {
                    buttons[button.index()] = sys::get_bit(&key_bits, codemap::button_to_code(button));
                }
                let mut axes = Vec::with_capacity(self.caps.axis_ranges.len());
                for &(axis, _, _) in &self.caps.axis_ranges {
                    if let Some(info) = probe_abs(self.fd.as_raw_fd(), codemap::abs_code(axis)) {
                        axes.push((axis, info.value));
                    }
                }
                StateSnapshot::Gamepad { buttons, axes }
            }
        })
    }

    fn create_effect(&mut self, _motor: u32, kind: ForceKind) -> Option<EffectHandle> {
        if self.effect_count >= sys::FF_MAX_EFFECTS {
            return None;
        }
        let mut effect = sys::ff_effect { type_: codemap::ff_type(kind), id: -1, ..Default::default() };
        let ok = unsafe { sys::ioctl(self.fd.as_raw_fd(), sys::eviocsff(), &mut effect) };
        if ok && effect.id >= 0 {
            self.effect_count += 1;
            Some(EffectHandle(effect.id as u32))
        } else {
            None
        }
    }

    fn upload_effect(&mut self, effect: EffectHandle, kind: ForceKind, params: &ForceParams) -> bool {
        let mut wire = codemap::translate_effect(kind, params);
        wire.id = effect.0 as i16;
        unsafe { sys::ioctl(self.fd.as_raw_fd(), sys::eviocsff(), &mut wire) }
    }

    fn play_effect(&mut self, effect: EffectHandle, kind: ForceKind) -> bool {
        // condition effects are re-triggered indefinitely, everything else
        // plays once per start
        let repeat = if kind.is_condition() { i32::MAX } else { 1 };
        self.write_event(sys::EV_FF, effect.0 as u16, repeat)
    }

    fn stop_effect(&mut self, effect: EffectHandle) -> bool {
        self.write_event(sys::EV_FF, effect.0 as u16, 0)
    }

    fn destroy_effect(&mut self, effect: EffectHandle) {
        let mut id = effect.0 as libc::c_int;
        unsafe { sys::ioctl(self.fd.as_raw_fd(), sys::eviocrmff(), &mut id) };
        self.effect_status.remove(&(effect.0 as u16));
        self.effect_count = self.effect_count.saturating_sub(1);
    }

    fn set_motor_gain(&mut self, _motor: u32, gain: f32) -> bool {
        if !self.caps.supports_gain {
            return false;
        }
        self.write_event(sys::EV_FF, sys::FF_GAIN, (gain * 0xffff as f32) as i32)
    }

    fn disable_autocenter(&mut self) {
        if self.caps.supports_autocenter {
            self.write_event(sys::EV_FF, sys::FF_AUTOCENTER, 0);
        }
    }

    fn effect_status(&self, effect: EffectHandle) -> ForceStatus {
        self.effect_status
            .get(&(effect.0 as u16))
            .copied()
            .unwrap_or(ForceStatus::Unknown)
    }
}
