//! Body and face landmark types produced by the external pose estimator.
//!
//! Coordinates are normalized to the frame: `x` and `y` in `[0, 1]` with the
//! origin at the top-left corner, so a smaller `y` is higher on screen.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Number of points in a body landmark set.
pub const BODY_LANDMARK_COUNT: usize = 33;

/// Named body joints, in the estimator's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    /// Index of this joint in a `BodyLandmarkSet`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A single body keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyLandmark {
    pub x: f32,
    pub y: f32,
    /// Detection confidence in `[0, 1]`
    #[serde(default)]
    pub visibility: f32,
}

impl BodyLandmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }
}

/// Axis-aligned bounds of a set of normalized points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl LandmarkBounds {
    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// The full 33-point body pose of one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BodyLandmark>", into = "Vec<BodyLandmark>")]
pub struct BodyLandmarkSet {
    points: Vec<BodyLandmark>,
}

impl BodyLandmarkSet {
    /// Build a landmark set, rejecting anything that is not exactly 33 points.
    pub fn new(points: Vec<BodyLandmark>) -> ModelResult<Self> {
        if points.len() != BODY_LANDMARK_COUNT {
            return Err(ModelError::invalid_landmark_count(
                BODY_LANDMARK_COUNT,
                points.len(),
            ));
        }
        Ok(Self { points })
    }

    /// Landmark for a named joint.
    #[inline]
    pub fn get(&self, joint: PoseLandmark) -> BodyLandmark {
        self.points[joint.index()]
    }

    /// Replace a single joint, returning the updated set.
    pub fn with(mut self, joint: PoseLandmark, landmark: BodyLandmark) -> Self {
        self.points[joint.index()] = landmark;
        self
    }

    pub fn points(&self) -> &[BodyLandmark] {
        &self.points
    }

    /// Bounding box of every landmark, regardless of visibility.
    pub fn bounds(&self) -> LandmarkBounds {
        let mut bounds = LandmarkBounds {
            min_x: f32::MAX,
            min_y: f32::MAX,
            max_x: f32::MIN,
            max_y: f32::MIN,
        };
        for p in &self.points {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        bounds
    }
}

impl TryFrom<Vec<BodyLandmark>> for BodyLandmarkSet {
    type Error = ModelError;

    fn try_from(points: Vec<BodyLandmark>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<BodyLandmarkSet> for Vec<BodyLandmark> {
    fn from(set: BodyLandmarkSet) -> Self {
        set.points
    }
}

/// A single face mesh point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl FaceLandmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Dense face mesh; only present when a face is frontal enough to register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarkMesh {
    points: Vec<FaceLandmark>,
}

impl FaceLandmarkMesh {
    /// Mesh index of the upper inner lip.
    pub const UPPER_LIP: usize = 13;
    /// Mesh index of the lower inner lip.
    pub const LOWER_LIP: usize = 14;

    pub fn new(points: Vec<FaceLandmark>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[FaceLandmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Upper-lip landmark, if the mesh is dense enough to carry it.
    pub fn upper_lip(&self) -> Option<FaceLandmark> {
        if self.points.len() <= Self::LOWER_LIP {
            return None;
        }
        self.points.get(Self::UPPER_LIP).copied()
    }
}

/// Everything the landmark estimator returned for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Body pose; `None` when nobody is in view
    #[serde(default)]
    pub pose: Option<BodyLandmarkSet>,
    /// Face mesh; `None` when the face is turned away or hidden
    #[serde(default)]
    pub face: Option<FaceLandmarkMesh>,
}

impl LandmarkFrame {
    /// A frame with no person in it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(pose: Option<BodyLandmarkSet>, face: Option<FaceLandmarkMesh>) -> Self {
        Self { pose, face }
    }

    pub fn has_person(&self) -> bool {
        self.pose.is_some()
    }
}
