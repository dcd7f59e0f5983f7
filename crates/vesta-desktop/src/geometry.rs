//! Initial window placement.

use vesta_kernel::{AppDescriptor, Placement, Size};

use crate::error::RendererError;
use crate::host::Geometry;

/// Resolve the initial geometry of a surface.
///
/// Core applications are fullscreen and get no geometry. Centered windows
/// take `(viewport - size) / 2` on every axis without an explicit coordinate.
pub fn initial_geometry(
    descriptor: &AppDescriptor,
    viewport: Size,
) -> Result<Option<Geometry>, RendererError> {
    if descriptor.core {
        return Ok(None);
    }

    let size = descriptor.size;
    let placement = descriptor
        .position
        .placement()
        .map_err(|_| RendererError::InvalidPosition {
            app_id: descriptor.id.clone(),
        })?;

    let (x, y) = match placement {
        Placement::Centered { x, y } => {
            let center = Geometry::centered(size, viewport);
            (x.unwrap_or(center.x), y.unwrap_or(center.y))
        }
        Placement::Fixed { x, y } => (x, y),
    };

    Ok(Some(Geometry {
        x,
        y,
        w: size.w,
        h: size.h,
    }))
}
