use std::time::{Duration, Instant};

use anyhow::Result;
use log::{error, info, warn};

#[cfg(target_os = "android")]
mod android;

#[cfg(target_os = "android")]
pub use self::android::AndroidPermissions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    MediaLibrary,
}

impl Permission {
    pub fn denied_message(&self) -> &'static str {
        match self {
            Permission::Camera => "Camera permission was denied.",
            Permission::MediaLibrary => "Photo library permission was denied.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

/// What a gated feature should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    Waiting,
    Denied(&'static str),
    Ready,
}

pub const WAITING_MESSAGE: &str = "Checking permission...";

/// Marshmallow; older releases grant everything at install time.
pub const RUNTIME_PERMISSIONS_SDK: i32 = 23;

pub fn runtime_permissions(sdk_version: i32) -> bool {
    sdk_version >= RUNTIME_PERMISSIONS_SDK
}

pub fn android_permission_name(permission: Permission, sdk_version: i32) -> &'static str {
    match permission {
        Permission::Camera => "android.permission.CAMERA",
        Permission::MediaLibrary if sdk_version >= 33 => "android.permission.READ_MEDIA_IMAGES",
        Permission::MediaLibrary => "android.permission.READ_EXTERNAL_STORAGE",
    }
}

pub trait PermissionProbe {
    fn check(&self, permission: Permission) -> Result<bool>;
    fn request(&self, permission: Permission) -> Result<()>;

    /// Whether the platform would now show a rationale, which it starts doing
    /// once the user has refused the request.
    fn rationale(&self, _permission: Permission) -> Result<bool> {
        Ok(false)
    }
}

/// Platforms without a runtime permission model.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

impl PermissionProbe for AlwaysGranted {
    fn check(&self, _permission: Permission) -> Result<bool> {
        Ok(true)
    }

    fn request(&self, _permission: Permission) -> Result<()> {
        Ok(())
    }
}

/// Tri-state access check for one permission, polled from the UI loop.
///
/// The request is issued once. A refusal or an unanswered request past the
/// timeout shows as `Denied`, but `check` keeps running so a late grant still
/// unlocks the feature. `Granted` and probe failures are final.
#[derive(Debug)]
pub struct PermissionGate {
    permission: Permission,
    status: PermissionStatus,
    requested_at: Option<Instant>,
    rationale_at_request: bool,
    failed: bool,
    timeout: Duration,
}

impl PermissionGate {
    pub fn new(permission: Permission, timeout: Duration) -> Self {
        Self {
            permission,
            status: PermissionStatus::Undetermined,
            requested_at: None,
            rationale_at_request: false,
            failed: false,
            timeout,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn status(&self) -> PermissionStatus {
        self.status
    }

    pub fn view(&self) -> GateView {
        match self.status {
            PermissionStatus::Undetermined => GateView::Waiting,
            PermissionStatus::Denied => GateView::Denied(self.permission.denied_message()),
            PermissionStatus::Granted => GateView::Ready,
        }
    }

    pub fn poll(&mut self, probe: &dyn PermissionProbe, now: Instant) -> PermissionStatus {
        if self.status == PermissionStatus::Granted || self.failed {
            return self.status;
        }
        let before = self.status;
        match self.advance(probe, now) {
            Ok(status) => self.status = status,
            Err(err) => {
                error!("{:?} permission check failed: {err:?}", self.permission);
                self.failed = true;
                self.status = PermissionStatus::Denied;
            }
        }
        if self.status != before {
            info!("{:?} permission: {:?}", self.permission, self.status);
        }
        self.status
    }

    fn advance(&mut self, probe: &dyn PermissionProbe, now: Instant) -> Result<PermissionStatus> {
        if probe.check(self.permission)? {
            return Ok(PermissionStatus::Granted);
        }
        let Some(at) = self.requested_at else {
            self.rationale_at_request = probe.rationale(self.permission)?;
            probe.request(self.permission)?;
            self.requested_at = Some(now);
            return Ok(PermissionStatus::Undetermined);
        };
        if self.status == PermissionStatus::Denied {
            return Ok(PermissionStatus::Denied);
        }
        if !self.rationale_at_request && probe.rationale(self.permission)? {
            info!("{:?} permission refused by the user", self.permission);
            return Ok(PermissionStatus::Denied);
        }
        if now.saturating_duration_since(at) >= self.timeout {
            warn!("{:?} permission not granted within {:?}", self.permission, self.timeout);
            return Ok(PermissionStatus::Denied);
        }
        Ok(PermissionStatus::Undetermined)
    }
}
