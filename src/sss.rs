//! Separable Subsurface Scattering, Jimenez et al.
//!
//! Skin diffusion approximated as a sum of gaussians, discretized into a small
//! non-uniform kernel and applied as two 1D screen space blurs.

mod blur;
mod context;
mod error;
mod kernel;
mod profile;
mod texture;

pub use self::blur::*;
pub use self::context::*;
pub use self::error::*;
pub use self::kernel::*;
pub use self::profile::*;
pub use self::texture::*;
