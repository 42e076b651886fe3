//! Fixtures - a small stock model shared by scenarios and benches

use std::sync::Arc;

use marionette_core::{AssetSource, ExpressionDef, ExpressionList, MemoryAssetSource, MotionGroupTable};
use marionette_puppet::testing::{PathBehavior, RecordingPuppet};
use marionette_puppet::{AccessPath, Size};

/// Mouth parameter the stock puppet exposes
pub const MOUTH_PARAMETER: &str = "ParamMouthOpenY";

pub const SMILE_DOCUMENT: &str = r#"{
    "Type": "Live2D Expression",
    "FadeInTime": 0.3,
    "Parameters": [
        { "Id": "ParamEyeSmile", "Value": 1.0 },
        { "Id": "ParamMouthForm", "Value": 1.0 },
        { "Id": "ParamCheek", "Value": 0.6, "Blend": "Add" }
    ]
}"#;

pub const ANGRY_DOCUMENT: &str = r#"{
    "Type": "Live2D Expression",
    "Parameters": [
        { "Id": "ParamBrowAngry", "Value": 1.0 },
        { "Id": "ParamMouthForm", "Value": -1.0 }
    ]
}"#;

/// `Idle: [a, b]`, `TapBody: [c, d, e]`
pub fn motion_table() -> MotionGroupTable {
    MotionGroupTable::new()
        .with_group("Idle", ["motion/a.motion3.json", "motion/b.motion3.json"])
        .with_group(
            "TapBody",
            ["motion/c.motion3.json", "motion/d.motion3.json", "motion/e.motion3.json"],
        )
}

/// `[smile, angry]`
pub fn expression_list() -> ExpressionList {
    ExpressionList::new(vec![
        ExpressionDef::new("smile", "exp/smile.exp3.json"),
        ExpressionDef::new("angry", "exp/angry.exp3.json"),
    ])
}

/// Parameter-set documents for [`expression_list`]
pub fn expression_assets() -> Arc<dyn AssetSource> {
    Arc::new(
        MemoryAssetSource::new()
            .with_asset("exp/smile.exp3.json", SMILE_DOCUMENT)
            .with_asset("exp/angry.exp3.json", ANGRY_DOCUMENT),
    )
}

/// Puppet with every access path working and a native expression manager
pub fn native_puppet() -> RecordingPuppet {
    RecordingPuppet::new()
        .with_motions(motion_table())
        .with_expressions(expression_list())
        .with_parameter(MOUTH_PARAMETER, 0.0)
        .with_logical_size(Size::new(600.0, 1200.0))
}

/// Puppet without native expressions, forcing the manual fade
pub fn manual_puppet() -> RecordingPuppet {
    native_puppet().with_paths(
        &[
            AccessPath::ExpressionManager,
            AccessPath::ModelExpressionIndex,
            AccessPath::ModelExpressionName,
        ],
        PathBehavior::Missing,
    )
}

/// Puppet whose parameter table is unreachable
pub fn mute_puppet() -> RecordingPuppet {
    native_puppet()
        .with_paths(
            &[AccessPath::CoreParameters, AccessPath::ModelParameters],
            PathBehavior::Missing,
        )
        .with_add_support(false)
}
