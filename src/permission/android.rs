use anyhow::Result;
use jni::{
    objects::{JObject, JValueGen},
    sys::{JNIInvokeInterface_, _jobject, jint},
    JavaVM,
};
use log::info;

use super::{android_permission_name, runtime_permissions, Permission, PermissionProbe};

const REQUEST_CODE: i32 = 100;

/// Runtime permissions through the hosting activity.
pub struct AndroidPermissions {
    app: slint::android::AndroidApp,
    sdk_version: i32,
}

impl AndroidPermissions {
    pub fn new(app: slint::android::AndroidApp) -> Result<Self> {
        let sdk_version = sdk_version(&app)?;
        info!("sdk version:{sdk_version}");
        Ok(Self { app, sdk_version })
    }

    fn name(&self, permission: Permission) -> &'static str {
        android_permission_name(permission, self.sdk_version)
    }
}

impl PermissionProbe for AndroidPermissions {
    fn check(&self, permission: Permission) -> Result<bool> {
        if !runtime_permissions(self.sdk_version) {
            return Ok(true);
        }
        check_self_permission(&self.app, self.name(permission))
    }

    fn request(&self, permission: Permission) -> Result<()> {
        request_permissions(&self.app, &[self.name(permission)], REQUEST_CODE)
    }

    fn rationale(&self, permission: Permission) -> Result<bool> {
        if !runtime_permissions(self.sdk_version) {
            return Ok(false);
        }
        should_show_rationale(&self.app, self.name(permission))
    }
}

fn sdk_version(app: &slint::android::AndroidApp) -> Result<i32> {
    unsafe {
        let vm = JavaVM::from_raw(app.vm_as_ptr() as *mut *const JNIInvokeInterface_)?;
        let mut env = vm.attach_current_thread()?;
        Ok(env
            .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?
            .i()?)
    }
}

fn check_self_permission(app: &slint::android::AndroidApp, permission: &str) -> Result<bool> {
    unsafe {
        let vm = JavaVM::from_raw(app.vm_as_ptr() as *mut *const JNIInvokeInterface_)?;
        let mut env = vm.attach_current_thread()?;
        let granted = env
            .get_static_field(
                "android/content/pm/PackageManager",
                "PERMISSION_GRANTED",
                "I",
            )?
            .i()?;
        let permission = env.new_string(permission)?;
        let activity = JObject::from_raw(app.activity_as_ptr() as *mut _jobject);
        let result = env
            .call_method(
                activity,
                "checkSelfPermission",
                "(Ljava/lang/String;)I",
                &[JValueGen::Object(&JObject::from(permission))],
            )?
            .i()?;
        Ok(result == granted)
    }
}

fn should_show_rationale(app: &slint::android::AndroidApp, permission: &str) -> Result<bool> {
    unsafe {
        let vm = JavaVM::from_raw(app.vm_as_ptr() as *mut *const JNIInvokeInterface_)?;
        let mut env = vm.attach_current_thread()?;
        let permission = env.new_string(permission)?;
        let activity = JObject::from_raw(app.activity_as_ptr() as *mut _jobject);
        Ok(env
            .call_method(
                activity,
                "shouldShowRequestPermissionRationale",
                "(Ljava/lang/String;)Z",
                &[JValueGen::Object(&JObject::from(permission))],
            )?
            .z()?)
    }
}

fn request_permissions(
    app: &slint::android::AndroidApp,
    permissions: &[&str],
    request_code: i32,
) -> Result<()> {
    unsafe {
        let vm = JavaVM::from_raw(app.vm_as_ptr() as *mut *const JNIInvokeInterface_)?;
        let mut env = vm.attach_current_thread()?;
        let activity = JObject::from_raw(app.activity_as_ptr() as *mut _jobject);

        let names =
            env.new_object_array(permissions.len() as jint, "java/lang/String", JObject::null())?;
        for (index, permission) in permissions.iter().enumerate() {
            let name = env.new_string(*permission)?;
            env.set_object_array_element(&names, index as jint, name)?;
        }

        // result arrives in onRequestPermissionsResult, which NativeActivity does not
        // forward; the gate polls checkSelfPermission instead
        env.call_method(
            activity,
            "requestPermissions",
            "([Ljava/lang/String;I)V",
            &[JValueGen::Object(&JObject::from(names)), request_code.into()],
        )?;
    }
    info!("requested {permissions:?}");
    Ok(())
}

