//! The procedural pixel shader.
//!
//! The GPU runs [`PIXEL_SHADER_HLSL`] through a custom Direct2D effect. The
//! same colour function is mirrored on the CPU by [`shade_pixel`] so its
//! output can be checked without a device.

use bytemuck::{Pod, Zeroable};

use crate::compositor::types::FrameSize;

/// Class id the effect is registered under with the drawing factory.
pub const EFFECT_CLSID: u128 = 0x5c1f_3c6a_8e2b_4d07_9a41_6f0e_2b7d_c310;

/// Id the compiled pixel shader is loaded under in the effect context.
pub const PIXEL_SHADER_ID: u128 = 0x9b3e_71d4_0c5a_4f88_b2e6_1d4a_7c90_e5f2;

/// Registration XML for the effect: no inputs, no custom properties.
pub const EFFECT_XML: &str = r#"<?xml version='1.0'?>
<Effect>
    <Property name='DisplayName' type='string' value='Procedural Gradient'/>
    <Property name='Author' type='string' value='dcomp-shader'/>
    <Property name='Category' type='string' value='Source'/>
    <Property name='Description' type='string' value='Time-varying colour gradient'/>
    <Inputs/>
</Effect>"#;

/// Pixel shader source. Needs the scene position, takes no input images.
pub const PIXEL_SHADER_HLSL: &str = r#"
cbuffer constants : register(b0)
{
    float time : packoffset(c0.x);
    int2 dispatchSize : packoffset(c0.y);
};

float4 main(float4 clipSpaceOutput : SV_POSITION, float4 sceneSpaceOutput : SCENE_POSITION) : SV_TARGET
{
    int2 xy = (int2)sceneSpaceOutput.xy;
    float2 uv = xy / (float2)dispatchSize;
    float3 col = 0.5 + 0.5 * cos(time + float3(uv, uv.x) + float3(0, 2, 4));
    return float4(col, 1);
}
"#;

pub const PIXEL_SHADER_ENTRY: &str = "main";
pub const PIXEL_SHADER_TARGET: &str = "ps_5_0";

/// Constant buffer layout, matching the `cbuffer` above (one 16-byte register).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ShaderConstants {
    pub time: f32,
    pub dispatch_width: i32,
    pub dispatch_height: i32,
    _padding: i32,
}

impl ShaderConstants {
    pub fn new(time: f32, size: FrameSize) -> Self {
        Self {
            time,
            dispatch_width: size.width as i32,
            dispatch_height: size.height as i32,
            _padding: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// CPU reference of the pixel shader: RGBA for the pixel at (x, y).
pub fn shade_pixel(constants: &ShaderConstants, x: i32, y: i32) -> [f32; 4] {
    let u = x as f32 / constants.dispatch_width as f32;
    let v = y as f32 / constants.dispatch_height as f32;
    let channel = |uv: f32, phase: f32| 0.5 + 0.5 * (constants.time + uv + phase).cos();
    [channel(u, 0.0), channel(v, 2.0), channel(u, 4.0), 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn constants_fill_one_register() {
        let constants = ShaderConstants::new(1.5, FrameSize::new(1000, 640));
        assert_eq!(constants.as_bytes().len(), 16);
        assert_eq!(&constants.as_bytes()[0..4], &1.5f32.to_ne_bytes());
        assert_eq!(&constants.as_bytes()[4..8], &1000i32.to_ne_bytes());
        assert_eq!(&constants.as_bytes()[8..12], &640i32.to_ne_bytes());
    }

    #[test]
    fn origin_at_time_zero() {
        let constants = ShaderConstants::new(0.0, FrameSize::new(100, 100));
        let [r, g, b, a] = shade_pixel(&constants, 0, 0);
        assert!(approx(r, 1.0));
        assert!(approx(g, 0.5 + 0.5 * 2.0f32.cos()));
        assert!(approx(b, 0.5 + 0.5 * 4.0f32.cos()));
        assert_eq!(a, 1.0);
    }

    #[test]
    fn colour_stays_in_unit_range() {
        let size = FrameSize::new(64, 48);
        for step in 0..20 {
            let constants = ShaderConstants::new(step as f32 * 0.37, size);
            for (x, y) in [(0, 0), (63, 0), (0, 47), (63, 47), (31, 23)] {
                for channel in shade_pixel(&constants, x, y) {
                    assert!((0.0..=1.0).contains(&channel));
                }
            }
        }
    }

    #[test]
    fn red_and_blue_share_the_u_coordinate() {
        let constants = ShaderConstants::new(0.8, FrameSize::new(200, 100));
        let [r, _, b, _] = shade_pixel(&constants, 50, 90);
        let u = 50.0 / 200.0;
        assert!(approx(r, 0.5 + 0.5 * (0.8f32 + u).cos()));
        assert!(approx(b, 0.5 + 0.5 * (0.8f32 + u + 4.0).cos()));
    }
}
