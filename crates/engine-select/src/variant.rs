//! The two supported engine configurations.
//!
//! Variants differ only in emulated client identity and injected
//! compatibility shims; the navigation contract is identical, which is what
//! makes the hot-swap safe.

use serde::{Deserialize, Serialize};
use tabshell_core_types::EngineVariant;

const STANDARD_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

/// Sites keyed to the desktop identity lay out against a desktop viewport;
/// this shim pins one so media queries agree with the advertised client.
const DESKTOP_VIEWPORT_SHIM: &str = "(function(){\
var meta=document.querySelector('meta[name=viewport]')||document.createElement('meta');\
meta.name='viewport';meta.content='width=1024';\
document.head&&document.head.appendChild(meta);})();";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantProfile {
    pub variant: EngineVariant,
    pub user_agent: String,
    pub shims: Vec<String>,
}

/// Profiles for the closed two-variant set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantCatalog {
    standard: VariantProfile,
    desktop: VariantProfile,
}

impl Default for VariantCatalog {
    fn default() -> Self {
        Self {
            standard: VariantProfile {
                variant: EngineVariant::Standard,
                user_agent: STANDARD_USER_AGENT.to_string(),
                shims: Vec::new(),
            },
            desktop: VariantProfile {
                variant: EngineVariant::Desktop,
                user_agent: DESKTOP_USER_AGENT.to_string(),
                shims: vec![DESKTOP_VIEWPORT_SHIM.to_string()],
            },
        }
    }
}

impl VariantCatalog {
    pub fn profile(&self, variant: EngineVariant) -> &VariantProfile {
        match variant {
            EngineVariant::Standard => &self.standard,
            EngineVariant::Desktop => &self.desktop,
        }
    }
}
