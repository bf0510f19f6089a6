#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EquipmentRecord {
    pub id: i64,
    pub name: String,
    pub status: bool,
}

impl EquipmentRecord {
    pub fn new(id: i64, name: impl Into<String>, status: bool) -> Self {
        Self {
            id,
            name: name.into(),
            status,
        }
    }

    pub fn with_status(&self, status: bool) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

// Shape of both the on-disk snapshot and the GET_ALL response.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct EquipmentList {
    pub equipments: Vec<EquipmentRecord>,
}

impl EquipmentList {
    pub fn new(equipments: Vec<EquipmentRecord>) -> Self {
        Self { equipments }
    }

    pub fn find(&self, id: i64) -> Option<&EquipmentRecord> {
        self.equipments.iter().find(|record| record.id == id)
    }

    // Records with other ids pass through untouched.
    pub fn with_status(&self, id: i64, status: bool) -> Self {
        let equipments = self
            .equipments
            .iter()
            .map(|record| {
                if record.id == id {
                    record.with_status(status)
                } else {
                    record.clone()
                }
            })
            .collect();

        Self { equipments }
    }

    pub fn len(&self) -> usize {
        self.equipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equipments.is_empty()
    }
}
