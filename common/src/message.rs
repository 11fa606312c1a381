//! WhatsApp 用メッセージとディープリンク
//!
//! 申請（承認者宛て）と実行確認（連絡先選択画面）の2種類。

use crate::requests::MassEditEntry;
use crate::types::{EditMode, PendingStoreChange, PendingTimeChange, Visit};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// encodeURIComponent と同じくエスケープしない記号を除いた集合
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const BRAZIL_PREFIX: &str = "55";
const NO_TYPE: &str = "(SELECIONE O TIPO)";
const NOT_INFORMED: &str = "Não informado";

/// ディープリンクを作成
///
/// 番号なしの場合は連絡先選択画面を開くリンクになる。
/// 番号は数字のみに整え、先頭が 55 でなければ国番号を付与する。
pub fn whatsapp_link(number: Option<&str>, text: &str) -> String {
    let encoded = utf8_percent_encode(text, URI_COMPONENT).to_string();

    let digits: String = number
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    if digits.is_empty() {
        return format!("https://wa.me/?text={}", encoded);
    }

    let number = if digits.starts_with(BRAZIL_PREFIX) {
        digits
    } else {
        format!("{}{}", BRAZIL_PREFIX, digits)
    };
    format!("https://wa.me/{}?text={}", number, encoded)
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// 時間変更の申請
pub fn time_change_request(approver: &str, visit: &Visit, new_in: &str, new_out: &str, reason: &str) -> String {
    format!(
        "Olá, {approver}. Gostaria de verificar a possibilidade de alteração de *HORÁRIO* nesta loja:

📅 *Data:* {date}
📍 *Loja:* {store}
🕒 *Horário Atual:* {check_in} - {check_out}
🆕 *Novo Horário:* {new_in} - {new_out}

📝 *Motivo:* {reason}",
        date = visit.date,
        store = visit.store,
        check_in = visit.check_in,
        check_out = visit.check_out,
    )
}

/// 時間変更の実行確認
pub fn time_change_execution(approver: &str, pending: &PendingTimeChange, visit_date: &str) -> String {
    format!(
        "Pode alterar o *HORÁRIO* desta visita?

📅 *Data:* {date}
📍 *Loja:* {store}
🕒 *De:* {orig_in} - {orig_out}
➡️ *Para:* {new_in} - {new_out}

✅ Já alinhado com o {approver}.
Obrigado!",
        date = or_default(&pending.date, visit_date),
        store = pending.store,
        orig_in = pending.original_check_in,
        orig_out = pending.original_check_out,
        new_in = pending.new_check_in,
        new_out = pending.new_check_out,
    )
}

/// 店舗（JP）変更の申請
pub fn store_change_request(
    approver: &str,
    visit: &Visit,
    pending: &PendingStoreChange,
    reason: &str,
) -> String {
    format!(
        "Olá, {approver}. Gostaria de verificar a possibilidade de alteração de *JP (Loja)*:

📍 *De:* {store}
🕒 *Horário:* {check_in}

⬇️ *PARA* ⬇️

📍 *Nova Loja:* {new_store}
📅 *Data:* {date}
🕒 *Novo Horário:* {new_time} - {new_time_end}
🏷️ *Tipo:* {visit_type}

📝 *Motivo:* {reason}",
        store = visit.store,
        check_in = visit.check_in,
        new_store = pending.new_store,
        date = visit.date,
        new_time = pending.new_time,
        new_time_end = pending.new_time_end,
        visit_type = or_default(&pending.visit_type, NO_TYPE),
    )
}

/// 店舗（JP）変更の実行確認
pub fn store_change_execution(approver: &str, pending: &PendingStoreChange) -> String {
    format!(
        "Pode alterar o *JP* desta visita?

📍 *De:* {original}
⬇️ *Para:* {new_store}
📅 *Nova Data:* {new_date}
🕒 *Novo Horário:* {new_time} - {new_time_end}
🏷️ *Tipo:* {visit_type}

✅ Já alinhado com o {approver}.
Obrigado!",
        original = pending.original_store,
        new_store = pending.new_store,
        new_date = or_default(&pending.new_date, "Mesmo dia"),
        new_time = pending.new_time,
        new_time_end = pending.new_time_end,
        visit_type = or_default(&pending.visit_type, "N/A"),
    )
}

/// 新規訪問の申請
pub fn inclusion_request(approver: &str, visit: &Visit) -> String {
    format!(
        "Olá, {approver}. Gostaria de incluir uma *NOVA VISITA* nesta data:

📅 *Data:* {date}
📍 *Loja:* {store}
🕒 *Horário:* {check_in} - {check_out}
🏷️ *Tipo:* {visit_type}

📝 *Motivo:* {reason}",
        date = visit.date,
        store = visit.store,
        check_in = visit.check_in,
        check_out = visit.check_out,
        visit_type = or_default(&visit.visit_type, "N/A"),
        reason = visit.reason,
    )
}

/// 新規訪問の実行確認
pub fn inclusion_execution(approver: &str, visit: &Visit) -> String {
    format!(
        "Pode confirmar a *INCLUSÃO* desta visita?

📅 *Data:* {date}
📍 *Loja:* {store}
🕒 *Horário:* {check_in} - {check_out}
🏷️ *Tipo:* {visit_type}

📝 *Motivo:* {reason}

✅ Já alinhado com o {approver}.
Obrigado!",
        date = visit.date,
        store = visit.store,
        check_in = visit.check_in,
        check_out = visit.check_out,
        visit_type = or_default(&visit.visit_type, "N/A"),
        reason = or_default(&visit.reason, "N/A"),
    )
}

/// 一括変更のメッセージ
pub fn mass_edit(approver: &str, mode: EditMode, is_execution: bool, entries: &[MassEditEntry]) -> String {
    let mut message = match (mode, is_execution) {
        (EditMode::Store, true) => {
            format!("*EXECUÇÃO DE ALTERAÇÃO EM MASSA (JP)*\n✅ Já alinhado com o {approver}.\n\n")
        }
        (EditMode::Store, false) => format!(
            "Olá, {approver}. Por gentileza, é possível realizar a alteração de Loja (JP) dessas visitas abaixo?\n\n"
        ),
        (EditMode::Time, true) => {
            format!("*EXECUÇÃO DE ALTERAÇÃO EM MASSA (HORÁRIO)*\n✅ Já alinhado com o {approver}.\n\n")
        }
        (EditMode::Time, false) => format!(
            "Olá, {approver}. Por gentileza, é possível alterar o horário de atendimento dessas lojas abaixo?\n\n"
        ),
    };

    for entry in entries {
        let visit = &entry.visit;
        let edit = &entry.edit;
        let start = or_default(&edit.new_start_time, &visit.check_in);
        let end = or_default(&edit.new_end_time, &visit.check_out);

        match (mode, is_execution) {
            (EditMode::Store, false) => {
                message.push_str(&format!("*{}* ➡️ DE: {} ➡️ PARA: {}\n", visit.date, visit.store, edit.new_store));
                message.push_str(&format!(
                    "🏷️ Tipo: {} | 🕒 {} - {}\n",
                    or_default(&edit.visit_type, NO_TYPE),
                    start,
                    end
                ));
                message.push_str(&format!("📝 Motivo: {}\n\n\n", or_default(&edit.reason, NOT_INFORMED)));
            }
            (EditMode::Store, true) => {
                message.push_str(&format!("*{}* ➡️ DE: {} ➡️ PARA: {}\n", visit.date, visit.store, edit.new_store));
                message.push_str(&format!("🏷️ {} | 🕒 {} - {}\n\n", or_default(&edit.visit_type, NO_TYPE), start, end));
            }
            (EditMode::Time, false) => {
                message.push_str(&format!("*{}* | {}\n", visit.date, visit.store));
                message.push_str(&format!(
                    "🕒 DE: {} - {} ➡️ PARA: {} - {}\n",
                    visit.check_in, visit.check_out, edit.new_start_time, edit.new_end_time
                ));
                message.push_str(&format!("📝 Motivo: {}\n\n\n", or_default(&edit.reason, NOT_INFORMED)));
            }
            (EditMode::Time, true) => {
                message.push_str(&format!("*{}* | {}\n", visit.date, visit.store));
                message.push_str(&format!("🕒 NOVO HORÁRIO: {} - {}\n\n", edit.new_start_time, edit.new_end_time));
            }
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::MassEdit;

    fn visit() -> Visit {
        Visit {
            date: "05/01/2026".into(),
            store: "LOJA A".into(),
            check_in: "08:00".into(),
            check_out: "10:00".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_link_with_number() {
        let link = whatsapp_link(Some("(11) 97356-2750"), "Olá, tudo bem?");
        assert_eq!(link, "https://wa.me/5511973562750?text=Ol%C3%A1%2C%20tudo%20bem%3F");
    }

    #[test]
    fn test_link_keeps_country_code() {
        let link = whatsapp_link(Some("+55 11 90000-0000"), "a");
        assert!(link.starts_with("https://wa.me/5511900000000?"));
    }

    #[test]
    fn test_link_without_number() {
        assert_eq!(whatsapp_link(None, "x*y (z)"), "https://wa.me/?text=x*y%20(z)");
        assert_eq!(whatsapp_link(Some(""), "a\nb"), "https://wa.me/?text=a%0Ab");
    }

    #[test]
    fn test_time_change_request_text() {
        let text = time_change_request("André", &visit(), "09:00", "11:00", "trânsito");
        assert!(text.starts_with("Olá, André."));
        assert!(text.contains("🕒 *Horário Atual:* 08:00 - 10:00"));
        assert!(text.contains("🆕 *Novo Horário:* 09:00 - 11:00"));
        assert!(text.ends_with("📝 *Motivo:* trânsito"));
    }

    #[test]
    fn test_mass_edit_store_request() {
        let entries = vec![MassEditEntry {
            visit: visit(),
            edit: MassEdit {
                new_store: "LOJA B".into(),
                ..Default::default()
            },
        }];
        let text = mass_edit("André", EditMode::Store, false, &entries);
        assert!(text.contains("*05/01/2026* ➡️ DE: LOJA A ➡️ PARA: LOJA B\n"));
        assert!(text.contains("🏷️ Tipo: (SELECIONE O TIPO) | 🕒 08:00 - 10:00\n"));
        assert!(text.contains("📝 Motivo: Não informado"));
    }

    #[test]
    fn test_mass_edit_time_execution() {
        let entries = vec![MassEditEntry {
            visit: visit(),
            edit: MassEdit {
                new_start_time: "13:00".into(),
                new_end_time: "15:00".into(),
                ..Default::default()
            },
        }];
        let text = mass_edit("André", EditMode::Time, true, &entries);
        assert!(text.starts_with("*EXECUÇÃO DE ALTERAÇÃO EM MASSA (HORÁRIO)*"));
        assert!(text.ends_with("🕒 NOVO HORÁRIO: 13:00 - 15:00\n\n"));
    }
}
