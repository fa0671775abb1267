//! # RenderingControl Service - Volume et mute
//!
//! Un seul canal est supporté : `Master`. Le mute n'est pas un état à part,
//! c'est un volume nul ; voir [`RendererInstance::set_mute`].

use std::sync::Arc;

use crate::errors::{ActionFault, RendererError};
use crate::instance::RendererInstance;
use crate::model::Channel;
use crate::registry::InstanceRegistry;

pub type RcsResult<T> = Result<T, ActionFault>;

/// Highest `DesiredVolume` accepted.
pub const MAX_VOLUME: u16 = 100;

#[derive(Debug, Clone)]
pub struct RenderingControlService {
    registry: InstanceRegistry,
}

impl RenderingControlService {
    pub fn new(registry: InstanceRegistry) -> Self {
        Self { registry }
    }

    fn instance(&self, instance_id: u32) -> RcsResult<Arc<RendererInstance>> {
        self.registry
            .get(instance_id)
            .map_err(ActionFault::from_rendering_control)
    }

    fn check_channel(channel: &str) -> RcsResult<()> {
        channel
            .parse::<Channel>()
            .map(|_| ())
            .map_err(|c| ActionFault::from_rendering_control(RendererError::InvalidChannel(c)))
    }

    pub fn current_instance_ids(&self) -> Vec<u32> {
        self.registry.instance_ids()
    }

    pub fn current_channels(&self) -> Vec<Channel> {
        vec![Channel::Master]
    }

    pub fn get_mute(&self, instance_id: u32, channel: &str) -> RcsResult<bool> {
        let instance = self.instance(instance_id)?;
        Self::check_channel(channel)?;
        Ok(instance.mute())
    }

    pub fn set_mute(&self, instance_id: u32, channel: &str, desired_mute: bool) -> RcsResult<()> {
        let instance = self.instance(instance_id)?;
        Self::check_channel(channel)?;
        instance.set_mute(desired_mute);
        Ok(())
    }

    pub fn get_volume(&self, instance_id: u32, channel: &str) -> RcsResult<u16> {
        let instance = self.instance(instance_id)?;
        Self::check_channel(channel)?;
        Ok(instance.volume_percent())
    }

    pub fn set_volume(&self, instance_id: u32, channel: &str, desired_volume: u16) -> RcsResult<()> {
        let instance = self.instance(instance_id)?;
        Self::check_channel(channel)?;
        if desired_volume > MAX_VOLUME {
            return Err(ActionFault::from_rendering_control(
                RendererError::VolumeOutOfRange(desired_volume),
            ));
        }
        instance.set_volume(f64::from(desired_volume) / 100.0);
        Ok(())
    }
}
