use std::{
    cell::RefCell,
    path::PathBuf,
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use log::{info, warn};
use slint::{Image, ModelRc, SharedString, Timer, TimerMode, VecModel};

use crate::analysis::{AnalysisService, HttpAnalysisClient, PickOutcome, UploadSession, UploadStart};
use crate::config::{AppConfig, PickerKind};
use crate::measure::MeasureScreen;
use crate::permission::{
    GateView, Permission, PermissionGate, PermissionProbe, PermissionStatus, WAITING_MESSAGE,
};
use crate::picker::{list_gallery, load_preview, GalleryChoice};

const PREVIEW_SIDE: u32 = 512;

slint::slint! {
    import { Button, VerticalBox, HorizontalBox, TabWidget, ListView } from "std-widgets.slint";

    export enum GateState { waiting, denied, ready }

    export struct Marker {
        x: length,
        y: length,
    }

    export component MainWindow inherits Window {
        title: "Foot Measure";
        preferred-width: 420px;
        preferred-height: 760px;

        in property <GateState> measure-gate;
        in property <string> measure-message;
        in property <string> measure-label;
        in property <[Marker]> markers;
        callback tapped(length, length);
        callback reset();

        in property <GateState> library-gate;
        in property <string> library-message;
        in property <bool> has-image;
        in property <string> image-name;
        in property <image> preview;
        in property <bool> loading;
        in property <[string]> result-lines;
        in-out property <string> alert-text;
        in property <bool> gallery-open;
        in property <[string]> gallery-items;
        callback pick-image();
        callback upload();
        callback gallery-chosen(int);
        callback gallery-cancelled();

        TabWidget {
            width: 100%;
            height: 100%;
            Tab {
                title: "Measure";
                Rectangle {
                    background: #000;
                    if root.measure-gate != GateState.ready: Text {
                        text: root.measure-message;
                        color: white;
                        horizontal-alignment: center;
                        vertical-alignment: center;
                    }
                    if root.measure-gate == GateState.ready: TouchArea {
                        clicked => {
                            root.tapped(self.pressed-x, self.pressed-y);
                        }
                        for marker in root.markers: Rectangle {
                            x: marker.x - 8px;
                            y: marker.y - 8px;
                            width: 16px;
                            height: 16px;
                            border-radius: 8px;
                            background: #ff3b30;
                        }
                    }
                    if root.measure-gate == GateState.ready: Rectangle {
                        y: parent.height - self.height - 40px;
                        height: 100px;
                        VerticalLayout {
                            spacing: 10px;
                            HorizontalLayout {
                                alignment: center;
                                Rectangle {
                                    background: #00000099;
                                    border-radius: 10px;
                                    HorizontalLayout {
                                        padding: 10px;
                                        Text {
                                            text: root.measure-label;
                                            color: white;
                                            font-size: 18px;
                                        }
                                    }
                                }
                            }
                            HorizontalLayout {
                                alignment: center;
                                Button {
                                    text: "Reset";
                                    clicked => {
                                        root.reset();
                                    }
                                }
                            }
                        }
                    }
                }
            }
            Tab {
                title: "Analyze";
                VerticalBox {
                    if root.library-gate != GateState.ready: Text {
                        text: root.library-message;
                        horizontal-alignment: center;
                    }
                    if root.library-gate == GateState.ready: Button {
                        text: "Pick image";
                        clicked => {
                            root.pick-image();
                        }
                    }
                    Image {
                        source: root.preview;
                        height: 240px;
                        image-fit: contain;
                    }
                    Text {
                        text: root.image-name;
                        horizontal-alignment: center;
                    }
                    Button {
                        text: root.loading ? "Analyzing..." : "Upload and analyze";
                        enabled: root.has-image && !root.loading;
                        clicked => {
                            root.upload();
                        }
                    }
                    for line in root.result-lines: Text {
                        text: line;
                        font-size: 16px;
                    }
                }
            }
        }

        if root.gallery-open: Rectangle {
            width: 100%;
            height: 100%;
            background: #202020f0;
            TouchArea {}
            VerticalBox {
                Text {
                    text: "Choose a photo";
                    color: white;
                    font-size: 18px;
                }
                ListView {
                    for item[index] in root.gallery-items: TouchArea {
                        height: 44px;
                        clicked => {
                            root.gallery-chosen(index);
                        }
                        Text {
                            x: 8px;
                            text: item;
                            color: white;
                            vertical-alignment: center;
                        }
                    }
                }
                Button {
                    text: "Cancel";
                    clicked => {
                        root.gallery-cancelled();
                    }
                }
            }
        }

        if root.alert-text != "": Rectangle {
            width: 100%;
            height: 100%;
            background: #000000aa;
            TouchArea {}
            Rectangle {
                width: 80%;
                height: 150px;
                background: white;
                border-radius: 12px;
                VerticalBox {
                    Text {
                        text: root.alert-text;
                        color: black;
                        wrap: word-wrap;
                    }
                    Button {
                        text: "OK";
                        clicked => {
                            root.alert-text = "";
                        }
                    }
                }
            }
        }
    }
}

struct Screens {
    measure: MeasureScreen,
    library: PermissionGate,
    upload: UploadSession,
    gallery: Vec<PathBuf>,
}

fn gate_state(view: GateView) -> (GateState, SharedString) {
    match view {
        GateView::Waiting => (GateState::Waiting, WAITING_MESSAGE.into()),
        GateView::Denied(message) => (GateState::Denied, message.into()),
        GateView::Ready => (GateState::Ready, SharedString::new()),
    }
}

fn sync_gates(app: &MainWindow, screens: &Screens) {
    let (state, message) = gate_state(screens.measure.view());
    app.set_measure_gate(state);
    app.set_measure_message(message);
    let (state, message) = gate_state(screens.library.view());
    app.set_library_gate(state);
    app.set_library_message(message);
}

fn sync_measure(app: &MainWindow, screens: &Screens) {
    let estimator = screens.measure.estimator();
    let markers: Vec<Marker> = estimator
        .points()
        .iter()
        .map(|p| Marker { x: p.x, y: p.y })
        .collect();
    app.set_markers(ModelRc::new(VecModel::from(markers)));
    app.set_measure_label(estimator.label().into());
}

fn sync_upload(app: &MainWindow, screens: &Screens) {
    let session = &screens.upload;
    app.set_has_image(session.image().is_some());
    app.set_image_name(
        session
            .image()
            .and_then(|image| image.path().file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
            .into(),
    );
    app.set_loading(session.loading());
    let lines: Vec<SharedString> = session
        .result()
        .map(|result| result.display_lines().into_iter().map(Into::into).collect())
        .unwrap_or_default();
    app.set_result_lines(ModelRc::new(VecModel::from(lines)));
}

fn show_selection(app: &MainWindow, screens: &Screens) {
    let preview = screens
        .upload
        .image()
        .map(|image| load_preview(image.path(), PREVIEW_SIDE));
    match preview {
        Some(Ok(buffer)) => app.set_preview(Image::from_rgba8(buffer)),
        Some(Err(err)) => {
            warn!("no preview: {err:?}");
            app.set_preview(Image::default());
        }
        None => app.set_preview(Image::default()),
    }
    sync_upload(app, screens);
}

pub fn run(
    #[cfg(target_os = "android")]
    android_app: slint::android::AndroidApp,
    config: AppConfig,
) -> Result<()> {
    info!("analysis endpoint: {}", config.analyze_url());

    #[cfg(target_os = "android")]
    let probe: Rc<dyn PermissionProbe> =
        Rc::new(crate::permission::AndroidPermissions::new(android_app)?);
    #[cfg(not(target_os = "android"))]
    let probe: Rc<dyn PermissionProbe> = Rc::new(crate::permission::AlwaysGranted);

    let service: Arc<dyn AnalysisService> = Arc::new(HttpAnalysisClient::new(&config)?);
    let screens = Rc::new(RefCell::new(Screens {
        measure: MeasureScreen::new(PermissionGate::new(
            Permission::Camera,
            config.permission_timeout(),
        )),
        library: PermissionGate::new(Permission::MediaLibrary, config.permission_timeout()),
        upload: UploadSession::new(service),
        gallery: vec![],
    }));
    let config = Rc::new(config);

    let app = MainWindow::new()?;
    {
        let screens = screens.borrow();
        sync_gates(&app, &screens);
        sync_measure(&app, &screens);
        sync_upload(&app, &screens);
    }

    let app_weak = app.as_weak();
    let timer_screens = screens.clone();
    let timer = Timer::default();
    timer.start(TimerMode::Repeated, Duration::from_millis(50), move || {
        let Some(app) = app_weak.upgrade() else {
            return;
        };
        // a modal picker dialog may still hold the state
        let Ok(mut screens) = timer_screens.try_borrow_mut() else {
            return;
        };
        let screens = &mut *screens;
        let now = Instant::now();
        let before = (screens.measure.view(), screens.library.view());
        let camera = screens.measure.gate_mut().poll(probe.as_ref(), now);
        // one system dialog at a time
        if camera != PermissionStatus::Undetermined {
            screens.library.poll(probe.as_ref(), now);
        }
        if before != (screens.measure.view(), screens.library.view()) {
            sync_gates(&app, screens);
        }

        if screens.upload.poll() {
            sync_upload(&app, screens);
            if let Some(alert) = screens.upload.take_alert() {
                app.set_alert_text(alert.into());
            }
        }
    });

    let app_weak = app.as_weak();
    let tap_screens = screens.clone();
    app.on_tapped(move |x, y| {
        let (Some(app), Ok(mut screens)) = (app_weak.upgrade(), tap_screens.try_borrow_mut())
        else {
            return;
        };
        if screens.measure.tap(x, y).is_some() {
            sync_measure(&app, &screens);
        }
    });

    let app_weak = app.as_weak();
    let reset_screens = screens.clone();
    app.on_reset(move || {
        let (Some(app), Ok(mut screens)) = (app_weak.upgrade(), reset_screens.try_borrow_mut())
        else {
            return;
        };
        screens.measure.reset();
        sync_measure(&app, &screens);
    });

    let app_weak = app.as_weak();
    let pick_screens = screens.clone();
    let pick_config = config.clone();
    app.on_pick_image(move || {
        let (Some(app), Ok(mut screens)) = (app_weak.upgrade(), pick_screens.try_borrow_mut())
        else {
            return;
        };
        let access = screens.library.status();
        match pick_config.picker {
            #[cfg(not(target_os = "android"))]
            PickerKind::Dialog => {
                let mut picker = crate::picker::DialogPicker::new(pick_config.gallery_dir.clone());
                if screens.upload.pick_image(access, &mut picker) == PickOutcome::Selected {
                    show_selection(&app, &screens);
                }
            }
            #[cfg(target_os = "android")]
            PickerKind::Dialog => {
                warn!("no native file dialog on android, using the gallery");
                open_gallery(&app, &mut screens, &pick_config.gallery_dir, access);
            }
            PickerKind::Gallery => {
                open_gallery(&app, &mut screens, &pick_config.gallery_dir, access);
            }
        }
    });

    let app_weak = app.as_weak();
    let chosen_screens = screens.clone();
    app.on_gallery_chosen(move |index| {
        let (Some(app), Ok(mut screens)) = (app_weak.upgrade(), chosen_screens.try_borrow_mut())
        else {
            return;
        };
        app.set_gallery_open(false);
        let Some(path) = usize::try_from(index)
            .ok()
            .and_then(|i| screens.gallery.get(i).cloned())
        else {
            return;
        };
        let access = screens.library.status();
        let mut choice = GalleryChoice::chosen(path);
        if screens.upload.pick_image(access, &mut choice) == PickOutcome::Selected {
            show_selection(&app, &screens);
        }
    });

    let app_weak = app.as_weak();
    let cancel_screens = screens.clone();
    app.on_gallery_cancelled(move || {
        let (Some(app), Ok(mut screens)) = (app_weak.upgrade(), cancel_screens.try_borrow_mut())
        else {
            return;
        };
        app.set_gallery_open(false);
        let access = screens.library.status();
        screens
            .upload
            .pick_image(access, &mut GalleryChoice::cancelled());
    });

    let app_weak = app.as_weak();
    let upload_screens = screens.clone();
    app.on_upload(move || {
        let (Some(app), Ok(mut screens)) = (app_weak.upgrade(), upload_screens.try_borrow_mut())
        else {
            return;
        };
        match screens.upload.upload() {
            UploadStart::Started => info!("upload started"),
            UploadStart::Busy => info!("upload already in flight"),
            UploadStart::NoImage => info!("nothing to upload"),
            UploadStart::Failed => warn!("upload could not start"),
        }
        sync_upload(&app, &screens);
        if let Some(alert) = screens.upload.take_alert() {
            app.set_alert_text(alert.into());
        }
    });

    app.run()?;
    Ok(())
}

fn open_gallery(
    app: &MainWindow,
    screens: &mut Screens,
    dir: &std::path::Path,
    access: PermissionStatus,
) {
    if access != PermissionStatus::Granted {
        warn!("gallery not opened, library access is {access:?}");
        return;
    }
    match list_gallery(dir) {
        Ok(paths) => {
            let names: Vec<SharedString> = paths
                .iter()
                .map(|p| {
                    p.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                        .into()
                })
                .collect();
            screens.gallery = paths;
            app.set_gallery_items(ModelRc::new(VecModel::from(names)));
            app.set_gallery_open(true);
        }
        Err(err) => {
            warn!("gallery unavailable: {err:?}");
        }
    }
}
