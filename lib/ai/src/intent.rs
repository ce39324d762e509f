//! Intents and extracted entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user is asking for.
///
/// Deserializes from the snake_case English names and from the Spanish
/// names the classifier prompt historically used. Anything else becomes
/// [`Intent::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[serde(alias = "crear_presupuesto")]
    CreateBudget,
    #[serde(alias = "agregar_item")]
    AddItem,
    #[serde(alias = "editar_item")]
    EditItem,
    #[serde(alias = "eliminar_item")]
    DeleteItem,
    #[serde(alias = "eliminar_presupuesto")]
    DeleteBudget,
    #[serde(alias = "confirmar_eliminacion")]
    ConfirmDelete,
    #[serde(alias = "cancelar")]
    CancelPending,
    #[serde(alias = "listar_presupuestos")]
    ListBudgets,
    #[serde(alias = "cambiar_presupuesto")]
    ChangeBudget,
    #[serde(alias = "descargar_presupuesto")]
    DownloadBudget,
    #[serde(alias = "ver_items")]
    ViewItems,
    #[serde(alias = "ver_total")]
    ViewTotal,
    #[serde(alias = "consulta_general")]
    GeneralQuery,
    #[serde(alias = "saludo")]
    Greeting,
    #[serde(other)]
    Unknown,
}

impl Intent {
    /// All intents, in prompt order.
    pub const ALL: [Intent; 15] = [
        Self::CreateBudget,
        Self::AddItem,
        Self::EditItem,
        Self::DeleteItem,
        Self::DeleteBudget,
        Self::ConfirmDelete,
        Self::CancelPending,
        Self::ListBudgets,
        Self::ChangeBudget,
        Self::DownloadBudget,
        Self::ViewItems,
        Self::ViewTotal,
        Self::GeneralQuery,
        Self::Greeting,
        Self::Unknown,
    ];

    /// Returns the wire name of the intent.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateBudget => "create_budget",
            Self::AddItem => "add_item",
            Self::EditItem => "edit_item",
            Self::DeleteItem => "delete_item",
            Self::DeleteBudget => "delete_budget",
            Self::ConfirmDelete => "confirm_delete",
            Self::CancelPending => "cancel_pending",
            Self::ListBudgets => "list_budgets",
            Self::ChangeBudget => "change_budget",
            Self::DownloadBudget => "download_budget",
            Self::ViewItems => "view_items",
            Self::ViewTotal => "view_total",
            Self::GeneralQuery => "general_query",
            Self::Greeting => "greeting",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value the classifier may send either alone or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A bare scalar.
    One(T),
    /// A list, one entry per item.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Returns true if this is a bare scalar.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, Self::One(_))
    }

    /// Number of values held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    /// Returns true if no values are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the first value, if any.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.first(),
        }
    }

    /// Returns the value at `index`. A scalar only answers index 0.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        match self {
            Self::One(value) => (index == 0).then_some(value),
            Self::Many(values) => values.get(index),
        }
    }

    /// Converts into a sequence; a scalar becomes a singleton.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

/// Entities extracted from an utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entities {
    /// Budget named in the current message.
    #[serde(default, alias = "nombrePresupuesto", skip_serializing_if = "Option::is_none")]
    pub budget_name: Option<String>,
    /// Item name(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<OneOrMany<String>>,
    /// Quantity or quantities.
    #[serde(default, alias = "cantidad", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<OneOrMany<f64>>,
    /// Unit price(s); a `null` entry means "look it up".
    #[serde(default, alias = "precioUnitario", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<OneOrMany<Option<f64>>>,
    /// 1-based position picked from a list.
    #[serde(default, alias = "numeroSeleccion", skip_serializing_if = "Option::is_none")]
    pub selection_index: Option<i64>,
}

impl Entities {
    /// Returns the budget name if it is present and not blank.
    #[must_use]
    pub fn budget_name(&self) -> Option<&str> {
        self.budget_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Returns true if at least one non-blank item name was extracted.
    #[must_use]
    pub fn has_item(&self) -> bool {
        match &self.item {
            Some(OneOrMany::One(name)) => !name.trim().is_empty(),
            Some(OneOrMany::Many(names)) => names.iter().any(|n| !n.trim().is_empty()),
            None => false,
        }
    }

    /// Returns true if at least one positive quantity was extracted.
    #[must_use]
    pub fn has_quantity(&self) -> bool {
        match &self.quantity {
            Some(OneOrMany::One(q)) => *q > 0.0,
            Some(OneOrMany::Many(qs)) => qs.iter().any(|q| *q > 0.0),
            None => false,
        }
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// The classifier's reading of one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedUtterance {
    /// The intent.
    pub intent: Intent,
    /// Extracted entities.
    #[serde(default)]
    pub entities: Entities,
    /// Classifier confidence in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Whether the classifier needed earlier turns to decide.
    #[serde(default)]
    pub needs_context: bool,
}

impl ClassifiedUtterance {
    /// Creates a fully confident classification.
    #[must_use]
    pub fn new(intent: Intent, entities: Entities) -> Self {
        Self {
            intent,
            entities,
            confidence: 1.0,
            needs_context: false,
        }
    }

    /// The degraded result returned when classification fails.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            entities: Entities::default(),
            confidence: 0.0,
            needs_context: true,
        }
    }
}
