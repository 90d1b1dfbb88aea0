use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A global block-state id as sent by the server.
pub type BlockId = u32;

pub const AIR: BlockId = 0;

// 1.16.1 state ids of void_air and cave_air.
const VOID_AIR: BlockId = 9670;
const CAVE_AIR: BlockId = 9671;

/// How a block interacts with light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LightMaterial {
    #[serde(default)]
    pub opacity: u8,
    #[serde(default)]
    pub luminance: u8,
}

impl LightMaterial {
    pub const TRANSPARENT: LightMaterial = LightMaterial {
        opacity: 0,
        luminance: 0,
    };

    pub const OPAQUE: LightMaterial = LightMaterial {
        opacity: 15,
        luminance: 0,
    };

    pub const fn new(opacity: u8, luminance: u8) -> Self {
        LightMaterial {
            opacity: if opacity > 15 { 15 } else { opacity },
            luminance: if luminance > 15 { 15 } else { luminance },
        }
    }
}

/// The block metadata the world needs: which ids count as air and how each
/// id treats light. Passed explicitly to the decoder and the world.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRegistry {
    materials: HashMap<BlockId, LightMaterial>,
    air: HashSet<BlockId>,
    default_material: LightMaterial,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    air: Vec<BlockId>,
    #[serde(default)]
    blocks: HashMap<BlockId, LightMaterial>,
    #[serde(default = "default_opacity")]
    default_opacity: u8,
}

fn default_opacity() -> u8 {
    15
}

impl Default for BlockRegistry {
    fn default() -> Self {
        BlockRegistry::new()
    }
}

impl BlockRegistry {
    /// Air ids are transparent, everything else is opaque with no light.
    pub fn new() -> Self {
        BlockRegistry {
            materials: HashMap::new(),
            air: HashSet::new(),
            default_material: LightMaterial::OPAQUE,
        }
        .with_air(AIR)
        .with_air(VOID_AIR)
        .with_air(CAVE_AIR)
    }

    pub fn with_block(mut self, id: BlockId, material: LightMaterial) -> Self {
        self.materials.insert(id, material);
        self
    }

    pub fn with_air(mut self, id: BlockId) -> Self {
        self.air.insert(id);
        self.materials.insert(id, LightMaterial::TRANSPARENT);
        self
    }

    pub fn with_default_material(mut self, material: LightMaterial) -> Self {
        self.default_material = material;
        self
    }

    /// Parses `{ "air": [..], "blocks": { "<id>": { "opacity": n, "luminance": n } }, "default_opacity": n }`.
    /// Listed entries extend the built-in air ids.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: RegistryFile = serde_json::from_str(json)?;

        let mut registry = BlockRegistry::new()
            .with_default_material(LightMaterial::new(file.default_opacity, 0));
        for id in file.air {
            registry = registry.with_air(id);
        }
        for (id, material) in file.blocks {
            registry = registry.with_block(id, LightMaterial::new(material.opacity, material.luminance));
        }
        Ok(registry)
    }

    pub fn is_air(&self, id: BlockId) -> bool {
        self.air.contains(&id)
    }

    pub fn light_material(&self, id: BlockId) -> LightMaterial {
        self.materials
            .get(&id)
            .copied()
            .unwrap_or(self.default_material)
    }

    pub fn opacity(&self, id: BlockId) -> u8 {
        self.light_material(id).opacity
    }

    pub fn luminance(&self, id: BlockId) -> u8 {
        self.light_material(id).luminance
    }
}
