//! Prompt text sent to the language model.
//!
//! Prompts are in Spanish, the language users write in.

const INTENT_GUIDE: &str = "\
Intenciones válidas:
- create_budget: el usuario quiere crear un nuevo presupuesto
- add_item: el usuario quiere agregar uno o más ítems al presupuesto activo
- edit_item: el usuario quiere modificar un ítem existente
- delete_item: el usuario quiere borrar un ítem
- delete_budget: el usuario quiere eliminar un presupuesto completo (\"eliminar presupuesto\", \"borrar presupuesto\", \"eliminar hoja\")
- confirm_delete: el usuario confirma una eliminación (\"si\", \"sí\", \"confirmar\", \"ok\")
- cancel_pending: el usuario se arrepiente de una eliminación pendiente (\"no\", \"cancelar\", \"mejor no\")
- list_budgets: el usuario quiere ver todos sus presupuestos
- change_budget: el usuario quiere trabajar con otro presupuesto
- download_budget: el usuario quiere obtener el documento del presupuesto
- view_items: el usuario quiere ver la lista de ítems (\"ver items\", \"qué tengo\", \"lista\")
- view_total: el usuario quiere ver el total y resumen (\"total\", \"cuánto llevo\", \"resumen\")
- general_query: el usuario hace una pregunta o consulta
- greeting: el usuario saluda o inicia la conversación
- unknown: no se puede determinar la intención";

const ENTITY_GUIDE: &str = "\
Entidades a extraer:
- budgetName: nombre del presupuesto (string). SOLO si está mencionado EXPLÍCITAMENTE en el mensaje actual, nunca desde mensajes anteriores. \"cambiar\" no tiene budgetName; \"cambiar a casa ashly\" tiene budgetName \"casa ashly\".
- item: nombre del producto o servicio (string, o arreglo de strings para varios ítems)
- quantity: cantidad numérica (number, o arreglo para varios ítems). \"cinco\" es 5; \"5 metros\" es 5.
- unitPrice: precio por unidad en pesos (number, o arreglo; usa null para ítems sin precio). \"$15000\" y \"15 mil\" son 15000.
- selectionIndex: número elegido de una lista (number). \"eliminar item 2\" es 2, \"borrar el primero\" es 1.

Si el mensaje contiene una lista separada por comas, extrae arreglos del mismo largo.
Ejemplo: \"10 sacos cemento $8500, 5 kilos clavos\" produce
item: [\"sacos cemento\", \"kilos clavos\"], quantity: [10, 5], unitPrice: [8500, null]";

const OUTPUT_GUIDE: &str = "\
Responde SIEMPRE con un único objeto JSON con esta forma:
{
  \"intent\": \"nombre_intencion\",
  \"entities\": {\"budgetName\": ..., \"item\": ..., \"quantity\": ..., \"unitPrice\": ..., \"selectionIndex\": ...},
  \"confidence\": 0.95,
  \"needsContext\": false
}
Omite las entidades que no apliquen.";

/// Builds the classification system prompt.
#[must_use]
pub fn classification_system(active_budget: Option<&str>) -> String {
    format!(
        "Eres un sistema de clasificación de intenciones para un asistente de presupuestos por chat.\n\
         Analiza el mensaje del usuario y extrae la intención principal y sus entidades.\n\n\
         Contexto del usuario:\n- Presupuesto activo: {}\n\n{INTENT_GUIDE}\n\n{ENTITY_GUIDE}\n\n{OUTPUT_GUIDE}",
        active_budget.unwrap_or("ninguno")
    )
}

/// System prompt for unit price estimation.
pub const PRICE_ESTIMATE_SYSTEM: &str = "\
Eres un experto en precios de materiales de construcción en Chile.
Estima el precio UNITARIO actual del producto basándote en, por orden:
1. Homecenter Chile
2. Sodimac Chile
3. Precio promedio del mercado chileno

Responde SOLO con el número en pesos chilenos, sin puntos, comas ni símbolos.
Si se vende por metro, kilo o litro, da el precio de esa unidad.

Ejemplos:
\"saco de cemento\" -> 8500
\"metro de cerámica\" -> 12000
\"litro de pintura\" -> 15000";

/// Builds the price question for one item.
#[must_use]
pub fn price_estimate(item: &str) -> String {
    format!("¿Cuál es el precio unitario actual de: {item}?")
}
