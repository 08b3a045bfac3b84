//! Slot storage for scene objects and a scene that draws nothing

use glam::Vec3;

use super::{BoxDesc, FrameParams, MeshHandle, PointsHandle, Scene};
use crate::sim::ParticleStyle;

/// Slab of scene objects addressed by stable ids; freed slots are reused
#[derive(Debug, Clone)]
pub struct SceneStore<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for SceneStore<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> SceneStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: T) -> u32 {
        if let Some(id) = self.free.pop() {
            self.slots[id as usize] = Some(item);
            id
        } else {
            self.slots.push(Some(item));
            (self.slots.len() - 1) as u32
        }
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.slots.get(id as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.slots.get_mut(id as usize).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: u32) -> Option<T> {
        let item = self.slots.get_mut(id as usize)?.take()?;
        self.free.push(id);
        Some(item)
    }

    /// Live objects
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

/// Particle cloud as stored by a scene
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub style: ParticleStyle,
    pub positions: Vec<Vec3>,
}

/// Boxes and point clouds keyed by handle id; shared by both scenes
#[derive(Debug, Default)]
pub struct SceneObjects {
    pub boxes: SceneStore<BoxDesc>,
    pub points: SceneStore<PointCloud>,
}

impl SceneObjects {
    pub fn add_box(&mut self, desc: &BoxDesc) -> MeshHandle {
        MeshHandle(self.boxes.insert(*desc))
    }

    pub fn update_box(&mut self, handle: &MeshHandle, desc: &BoxDesc) {
        if let Some(slot) = self.boxes.get_mut(handle.0) {
            *slot = *desc;
        }
    }

    pub fn remove_box(&mut self, handle: MeshHandle) {
        self.boxes.remove(handle.0);
    }

    pub fn add_points(&mut self, style: ParticleStyle, positions: &[Vec3]) -> PointsHandle {
        PointsHandle(self.points.insert(PointCloud {
            style,
            positions: positions.to_vec(),
        }))
    }

    pub fn update_points(&mut self, handle: &PointsHandle, positions: &[Vec3]) {
        if let Some(cloud) = self.points.get_mut(handle.0) {
            cloud.positions.clear();
            cloud.positions.extend_from_slice(positions);
        }
    }

    pub fn remove_points(&mut self, handle: PointsHandle) {
        self.points.remove(handle.0);
    }
}

/// Scene that keeps the latest state of every object and never draws
#[derive(Debug, Default)]
pub struct HeadlessScene {
    objects: SceneObjects,
    frame: FrameParams,
    size: (u32, u32),
}

impl HeadlessScene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }

    pub fn boxes(&self) -> &SceneStore<BoxDesc> {
        &self.objects.boxes
    }

    pub fn box_desc(&self, handle: &MeshHandle) -> Option<&BoxDesc> {
        self.objects.boxes.get(handle.0)
    }

    pub fn points(&self) -> &SceneStore<PointCloud> {
        &self.objects.points
    }

    pub fn frame(&self) -> &FrameParams {
        &self.frame
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl Scene for HeadlessScene {
    fn add_box(&mut self, desc: &BoxDesc) -> MeshHandle {
        self.objects.add_box(desc)
    }

    fn update_box(&mut self, handle: &MeshHandle, desc: &BoxDesc) {
        self.objects.update_box(handle, desc);
    }

    fn remove_box(&mut self, handle: MeshHandle) {
        self.objects.remove_box(handle);
    }

    fn add_points(&mut self, style: ParticleStyle, positions: &[Vec3]) -> PointsHandle {
        self.objects.add_points(style, positions)
    }

    fn update_points(&mut self, handle: &PointsHandle, positions: &[Vec3]) {
        self.objects.update_points(handle, positions);
    }

    fn remove_points(&mut self, handle: PointsHandle) {
        self.objects.remove_points(handle);
    }

    fn set_frame(&mut self, frame: &FrameParams) {
        self.frame = *frame;
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
        }
    }
}
