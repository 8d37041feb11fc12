use flux_core::hand::{FlatJointSource, Handedness, Joint};
use glam::Vec3;
use wasm_bindgen::JsCast;
use web_sys as web;

fn handedness(source: &web::XrInputSource) -> Option<Handedness> {
    match source.handedness() {
        web::XrHandedness::Left => Some(Handedness::Left),
        web::XrHandedness::Right => Some(Handedness::Right),
        _ => None,
    }
}

// XRHand is a maplike keyed by joint name.
fn joint_space(hand: &web::XrHand, joint: Joint) -> Option<web::XrJointSpace> {
    let get = js_sys::Reflect::get(hand, &"get".into()).ok()?;
    let get: js_sys::Function = get.dyn_into().ok()?;
    get.call1(hand, &joint.xr_name().into())
        .ok()?
        .dyn_into::<web::XrJointSpace>()
        .ok()
}

/// Copy this frame's hand joints into `out`. Hands without an input source
/// this frame are cleared; joints without a pose are left unresolved.
pub fn sample_hands(frame: &web::XrFrame, space: &web::XrReferenceSpace, out: &mut FlatJointSource) {
    for hand in Handedness::BOTH {
        out.clear(hand);
    }
    let sources = frame.session().input_sources();
    for i in 0..sources.length() {
        let Some(source) = sources.get(i) else {
            continue;
        };
        let (Some(xr_hand), Some(hand)) = (source.hand(), handedness(&source)) else {
            continue;
        };
        for joint in Joint::ALL {
            let position = joint_space(&xr_hand, joint)
                .and_then(|js| frame.get_joint_pose(&js, space))
                .map(|pose| {
                    let p = pose.transform().position();
                    Vec3::new(p.x() as f32, p.y() as f32, p.z() as f32)
                });
            out.set_joint(hand, joint, position);
        }
    }
}
