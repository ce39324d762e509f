//! User-facing reply text.
//!
//! Every string the assistant sends lives here so wording can change
//! without touching control flow.

use budget_chat_ledger::{BudgetSummary, LineItem, format_clp, format_quantity};
use budget_chat_pricing::PriceSource;
use std::fmt::Write as _;

/// Sent when the turn pipeline itself fails.
pub const GENERIC_FAILURE: &str =
    "❌ Ocurrió un error al procesar tu mensaje. Por favor, intenta de nuevo.";

/// Sent before looking up prices.
pub const PRICE_LOOKUP_NOTICE: &str = "🔍 Buscando precio...";

/// Sent before rendering a document.
pub const RENDER_NOTICE: &str = "⏳ Generando tu presupuesto...";

pub const EDIT_NOT_AVAILABLE: &str = "📝 La función de editar items está en desarrollo. \
     Por ahora puedes eliminar el item y agregarlo de nuevo.";

pub const ASK_BUDGET_NAME: &str =
    "📊 ¿Cómo quieres llamar al nuevo presupuesto?\n\nEjemplo: \"Remodelación cocina\"";

pub const UNREGISTERED_ACCOUNT: &str =
    "⚠️ Cliente no registrado.\n\nContacta al administrador para configurar tu cuenta.";

pub const MISSING_LEDGER: &str = "⚠️ Error de configuración.\n\n\
     Tu cuenta no tiene un archivo de presupuestos asignado. Contacta al administrador.";

pub const NO_BUDGETS_YET: &str = "⚠️ Aún no tienes presupuestos.\n\n\
     📋 Estado actual: Sin presupuestos creados\n\n¿Quieres crear tu primer presupuesto?";

pub const NO_BUDGETS_OFFER: &str = "📋 No tienes presupuestos creados aún.\n\n¿Quieres crear uno?";

pub const NO_BUDGETS_TO_DELETE: &str = "📋 No tienes presupuestos para eliminar.";

pub const NO_ACTIVE_BUDGET: &str = "⚠️ No tienes un presupuesto activo.\n\n\
     📋 Usa \"ver presupuestos\" para seleccionar uno.";

pub const NOTHING_PENDING: &str = "⚠️ No hay ninguna eliminación pendiente de confirmar.";

pub const NOTHING_TO_CANCEL: &str = "👍 No hay ninguna eliminación pendiente.";

pub const RENDER_RETRY: &str =
    "❌ No pude generar el documento en este momento.\n\nPor favor intenta nuevamente.";

/// Apology for a failed action. Never includes the failure reason.
#[must_use]
pub fn apology(action: &str) -> String {
    format!("❌ No pude {action}. Por favor, intenta de nuevo en un momento.")
}

fn active_header(active: &str) -> String {
    format!("📊 Presupuesto: \"{active}\"\n\n")
}

/// Numbered budget list, marking the active one.
#[must_use]
pub fn budget_list(budgets: &[String], active: Option<&str>) -> String {
    let mut out = String::new();
    for (i, budget) in budgets.iter().enumerate() {
        let marker = if active == Some(budget.as_str()) {
            " ✅ ACTIVO"
        } else {
            ""
        };
        let _ = writeln!(out, "{}. {budget}{marker}", i + 1);
    }
    out
}

#[must_use]
pub fn greeting(active: Option<&str>) -> String {
    let mut out = String::from("¡Hola! 👋 Soy tu asistente de presupuestos.\n\n");
    match active {
        Some(active) => {
            let _ = write!(
                out,
                "📊 Presupuesto activo: \"{active}\"\n\nPuedes:\n\
                 • Agregar items\n• Ver items\n• Ver total\n• Descargar presupuesto\n"
            );
        }
        None => out.push_str("¿Qué quieres hacer?\n• Crear presupuesto\n• Ver presupuestos\n"),
    }
    out
}

#[must_use]
pub fn general_help(active: Option<&str>) -> String {
    match active {
        Some(active) => format!(
            "{}Comandos:\n\n• Agregar items\n• Ver items\n• Ver total\n• Eliminar item\n\
             • Descargar presupuesto\n• Cambiar presupuesto\n",
            active_header(active)
        ),
        None => "Sin presupuesto activo\n\n¿Qué quieres hacer?\n\n\
                 • Crear presupuesto\n• Ver presupuestos\n"
            .to_string(),
    }
}

#[must_use]
pub fn not_understood(active: Option<&str>) -> String {
    let mut out = active.map(active_header).unwrap_or_default();
    out.push_str(
        "🤔 No entendí.\n\nComandos:\n• Agregar items\n• Ver items\n• Ver total\n• Descargar presupuesto",
    );
    out
}

#[must_use]
pub fn budget_created(name: &str) -> String {
    format!(
        "✅ Presupuesto \"{name}\" creado\n\n\
         📋 Agrega items así:\n   \"10 sacos cemento\"\n   \
         \"5 metros cerámica a 12000\" (precio opcional)\n\n\
         💡 items | total | cambiar presupuesto | descargar"
    )
}

#[must_use]
pub fn name_collision(name: &str) -> String {
    format!(
        "❌ Ya existe un presupuesto llamado \"{name}\". \
         Prueba con otro nombre o agrega un número (ej: \"{name} 2\")"
    )
}

#[must_use]
pub fn budget_not_found(query: &str, budgets: &[String], active: Option<&str>) -> String {
    format!(
        "❌ No encontré un presupuesto llamado \"{query}\".\n\nTus presupuestos:\n\n{}",
        budget_list(budgets, active)
    )
}

#[must_use]
pub fn budget_vanished(name: &str, budgets: &[String]) -> String {
    if budgets.is_empty() {
        return format!("⚠️ El presupuesto \"{name}\" ya no existe.\n\n{NO_BUDGETS_OFFER}");
    }
    format!(
        "⚠️ El presupuesto \"{name}\" ya no existe.\n\nTus presupuestos:\n\n{}\n\
         💡 Responde con el nombre o número del presupuesto",
        budget_list(budgets, None)
    )
}

#[must_use]
pub fn pick_budget_for_items(budgets: &[String]) -> String {
    format!(
        "📋 ¿A qué presupuesto quieres agregar el item?\n\n{}\n\
         💡 Responde con el nombre o número del presupuesto",
        budget_list(budgets, None)
    )
}

#[must_use]
pub fn budgets_overview(budgets: &[String], active: Option<&str>) -> String {
    let mut out = format!("📋 Tus presupuestos:\n\n{}", budget_list(budgets, active));
    if active.is_none() {
        out.push_str("\n💡 Usa \"cambiar presupuesto\"");
    }
    out
}

#[must_use]
pub fn ask_which_budget(budgets: &[String], active: Option<&str>) -> String {
    format!(
        "📊 ¿A qué presupuesto quieres cambiar?\n\nTus presupuestos:\n\n{}\n\
         💡 Dime el nombre o número del presupuesto",
        budget_list(budgets, active)
    )
}

#[must_use]
pub fn budget_switched(name: &str) -> String {
    format!("✅ Presupuesto cambiado\n\n📊 Ahora trabajas en: \"{name}\"")
}

/// Checklist of the item details still missing.
#[must_use]
pub fn missing_item_details(active: &str, items: Option<&str>, quantities: Option<&str>) -> String {
    let mut out = active_header(active);
    out.push_str("Necesito:\n");
    match items {
        Some(items) => {
            let _ = writeln!(out, "• ✅ Producto: {items}");
        }
        None => out.push_str("• ❌ Producto\n"),
    }
    match quantities {
        Some(quantities) => {
            let _ = writeln!(out, "• ✅ Cantidad: {quantities}");
        }
        None => out.push_str("• ❌ Cantidad\n"),
    }
    out.push_str("\nEjemplo: \"15 metros cerámica\" o \"10 sacos cemento a $8500\"");
    out
}

fn price_label(source: Option<PriceSource>) -> String {
    source
        .map(|s| format!(" ({})", s.label()))
        .unwrap_or_default()
}

/// Confirmation for added items. `source` is `None` for user-supplied prices.
#[must_use]
pub fn items_added(active: &str, added: &[(LineItem, Option<PriceSource>)]) -> String {
    if let [(item, source)] = added {
        return format!(
            "✅ Item agregado\n\n📊 Presupuesto: \"{active}\"\n📦 {}\n   Cantidad: {}\n   \
             Precio: {}{}\n   Subtotal: {}",
            item.name,
            format_quantity(item.quantity),
            format_clp(item.unit_price as f64),
            price_label(*source),
            format_clp(item.subtotal)
        );
    }

    let mut out = format!(
        "✅ {} items agregados\n\n{}",
        added.len(),
        active_header(active)
    );
    let lines: Vec<String> = added
        .iter()
        .map(|(item, source)| {
            format!(
                "{}: {} x {}{}",
                item.name,
                format_quantity(item.quantity),
                format_clp(item.unit_price as f64),
                price_label(*source)
            )
        })
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

#[must_use]
pub fn empty_budget(active: &str) -> String {
    format!(
        "{}📭 Este presupuesto está vacío.\n\nAgrega items con:\n\"10 sacos de cemento a $8500\"",
        active_header(active)
    )
}

#[must_use]
pub fn item_list(active: &str, items: &[LineItem]) -> String {
    let mut out = format!("📊 \"{active}\"\n\nItems ({}):\n\n", items.len());
    for (i, item) in items.iter().enumerate() {
        let _ = write!(
            out,
            "{}. {}\n   {} x {} = {}\n\n",
            i + 1,
            item.name,
            format_quantity(item.quantity),
            format_clp(item.unit_price as f64),
            format_clp(item.subtotal)
        );
    }
    let summary = BudgetSummary::from_items(items);
    let _ = write!(out, "💰 Total: {}", format_clp(summary.total));
    out
}

#[must_use]
pub fn total_overview(active: &str, summary: &BudgetSummary) -> String {
    if summary.is_empty() {
        return format!(
            "{}📭 Este presupuesto está vacío. Total: {}",
            active_header(active),
            format_clp(0.0)
        );
    }

    let mut out = format!(
        "📊 \"{active}\"\n\n💰 TOTAL: {}\n\n{} items\nPromedio: {}\n",
        format_clp(summary.total),
        summary.count,
        format_clp(summary.mean)
    );
    if let (Some(most), Some(least)) = (&summary.most_expensive, &summary.least_expensive) {
        let _ = write!(
            out,
            "\nMás caro: {} ({})\nMás barato: {} ({})",
            most.name,
            format_clp(most.subtotal),
            least.name,
            format_clp(least.subtotal)
        );
    }
    out
}

#[must_use]
pub fn nothing_to_delete(active: &str) -> String {
    format!(
        "{}📭 Este presupuesto está vacío. No hay items para eliminar.",
        active_header(active)
    )
}

#[must_use]
pub fn pick_item_to_delete(active: &str, items: &[LineItem]) -> String {
    let mut out = active_header(active);
    out.push_str("¿Qué item eliminar?\n\n");
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {} - {}", i + 1, item.name, format_clp(item.subtotal));
    }
    out.push_str("\nEjemplo: \"eliminar 2\"");
    out
}

#[must_use]
pub fn item_deleted(active: &str, item: &LineItem) -> String {
    format!(
        "✅ Item eliminado\n\n{}🗑️ {}\n   {}",
        active_header(active),
        item.name,
        format_clp(item.subtotal)
    )
}

#[must_use]
pub fn ask_budget_to_delete(budgets: &[String], active: Option<&str>) -> String {
    format!(
        "⚠️ ¿Qué presupuesto quieres eliminar?\n\n{}\n💡 Dime el nombre del presupuesto a eliminar",
        budget_list(budgets, active)
    )
}

#[must_use]
pub fn confirm_budget_deletion(name: &str, summary: &BudgetSummary) -> String {
    format!(
        "⚠️ ¿Seguro que quieres eliminar \"{name}\"?\n\n📊 {} items · {}\n\n\
         Responde SI para confirmar o NO para cancelar",
        summary.count,
        format_clp(summary.total)
    )
}

#[must_use]
pub fn budget_deleted(name: &str) -> String {
    format!("✅ Presupuesto \"{name}\" eliminado correctamente.")
}

#[must_use]
pub fn deletion_cancelled(name: &str) -> String {
    format!("👍 Listo, no eliminé \"{name}\".")
}

#[must_use]
pub fn document_sent(active: &str) -> String {
    format!("✅ Presupuesto enviado\n\n📊 Presupuesto: \"{active}\"")
}

#[must_use]
pub fn nothing_to_render(active: &str) -> String {
    format!(
        "{}📭 Este presupuesto está vacío. Agrega items antes de descargarlo.",
        active_header(active)
    )
}
