//! Drives the label rule table over an image's labels.

use crate::error::Result;
use crate::host::HostEnv;
use crate::image::ImageConfig;
use crate::labels::AutoLabel;
use crate::options::OptionsBundle;

/// Accumulated output of all applied labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpretation {
    /// Flag fragments, in application order
    pub fragments: Vec<String>,
    /// Detail lines, in application order
    pub details: Vec<String>,
    /// True if any applied label asked for confirmation
    pub confirmation_required: bool,
}

/// Apply every recognized label of `image` to `bundle`.
///
/// Labels are applied in catalogue order so the rendered command line is
/// stable. Unknown labels are skipped. The first handler error aborts the
/// whole interpretation and is returned as-is.
pub fn interpret(
    image: &ImageConfig,
    bundle: &mut OptionsBundle,
    host: &dyn HostEnv,
) -> Result<Interpretation> {
    let mut out = Interpretation::default();

    for label in AutoLabel::ALL {
        let Some(value) = image.label(label.key()) else {
            continue;
        };

        let effect = label.apply(value, image, bundle, host)?;
        tracing::debug!(
            label = label.key(),
            fragments = ?effect.fragments,
            confirm = effect.confirm,
            "Applied image label"
        );

        out.fragments.extend(effect.fragments);
        out.details.extend(effect.detail);
        out.confirmation_required |= effect.confirm;
    }

    Ok(out)
}
