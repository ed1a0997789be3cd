//! User facing text, English and Spanish.
//!
//! There is one dispatcher; the locale only changes what it says.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FileOpError;
use crate::storage::AreaKind;

/// Replies that abandon whatever flow is pending, accepted in every locale.
pub const CANCEL_WORDS: &[&str] = &["cancel", "cancelar", "salir", "stop"];

pub fn is_cancel_word(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    CANCEL_WORDS.contains(&lowered.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "es" | "spanish" | "español" | "espanol" => Ok(Locale::Es),
            other => Err(anyhow!("Unsupported locale '{}' (expected 'en' or 'es')", other)),
        }
    }
}

/// Which flow a cancellation or prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Delete,
    Move,
    Rename,
    Go,
}

/// Message catalog bound to one locale.
#[derive(Debug, Clone, Copy)]
pub struct Texts {
    locale: Locale,
}

impl Texts {
    pub fn new(locale: Locale) -> Self { Self { locale } }

    pub fn locale(&self) -> Locale { self.locale }

    fn pick(&self, en: &'static str, es: &'static str) -> &'static str {
        match self.locale {
            Locale::En => en,
            Locale::Es => es,
        }
    }

    fn cmd_suffix(kind: AreaKind) -> &'static str {
        match kind {
            AreaKind::Photos => "p",
            AreaKind::Documents => "d",
        }
    }

    pub fn item_label(&self, kind: AreaKind, plural: bool) -> &'static str {
        match (kind, plural) {
            (AreaKind::Photos, false) => self.pick("photo", "foto"),
            (AreaKind::Photos, true) => self.pick("photos", "fotos"),
            (AreaKind::Documents, false) => self.pick("document", "documento"),
            (AreaKind::Documents, true) => self.pick("documents", "documentos"),
        }
    }

    // --- general ---

    pub fn not_authorized(&self) -> &'static str { self.pick("❌ Not authorized", "❌ No autorizado") }

    pub fn startup_notice(&self) -> &'static str { self.pick("✅ Server online", "✅ Servidor en línea") }

    pub fn help(&self) -> &'static str {
        self.pick(
            "Control bot ready.\n\nCommands:\n\
             /listp – List photos and folders\n\
             /listd – List documents and folders\n\
             /show <name> – Show image or active selection\n\
             /showd <name> – Search and show document\n\
             /gop <dir> – Change photo folder\n\
             /god <dir> – Change document folder\n\
             /rmp <name> – Delete photos or folders\n\
             /rmd <name> – Delete documents or folders\n\
             /mvp – Move photos or folders with assistant\n\
             /mvd – Move documents or folders with assistant\n\
             /rnp – Rename photo\n\
             /rnd – Rename document\n\
             /mkdirp <path> – Create photos folder\n\
             /mkdird <path> – Create documents folder\n\n\
             Send a photo or file to store it. Caption '-f <folder>' picks the folder.",
            "Bot de control listo.\n\nComandos:\n\
             /listp – Lista fotos y carpetas\n\
             /listd – Lista documentos y carpetas\n\
             /show <nombre> – Muestra imagen o selección activa\n\
             /showd <nombre> – Busca y muestra documento\n\
             /gop <dir> – Cambia la carpeta de fotos\n\
             /god <dir> – Cambia la carpeta de documentos\n\
             /rmp <nombre> – Borra fotos o carpetas\n\
             /rmd <nombre> – Borra documentos o carpetas\n\
             /mvp – Mueve fotos o carpetas con asistente\n\
             /mvd – Mueve documentos o carpetas con asistente\n\
             /rnp – Renombra foto\n\
             /rnd – Renombra documento\n\
             /mkdirp <ruta> – Crea carpeta de fotos\n\
             /mkdird <ruta> – Crea carpeta de documentos\n\n\
             Envía una foto o archivo para guardarlo. El pie '-f <carpeta>' elige la carpeta.",
        )
    }

    pub fn unknown_command(&self, command: &str) -> String {
        match self.locale {
            Locale::En => format!("❌ Unknown command: {command}. Use /start to see the available list."),
            Locale::Es => format!("❌ Comando desconocido: {command}. Usa /start para ver la lista disponible."),
        }
    }

    pub fn not_understood(&self) -> &'static str {
        self.pick(
            "⚠️ I didn't understand. Use /listp, /listd, /show, /showd, or a valid number.",
            "⚠️ No entendí. Usa /listp, /listd, /show, /showd o un número válido.",
        )
    }

    pub fn cancelled(&self, flow: FlowKind) -> &'static str {
        match flow {
            FlowKind::Move => self.pick("Move operation cancelled.", "Operación de mover cancelada."),
            FlowKind::Rename => self.pick("Rename operation cancelled.", "Operación de renombrar cancelada."),
            FlowKind::Delete | FlowKind::Go => self.pick("Operation cancelled.", "Operación cancelada."),
        }
    }

    pub fn enter_number(&self) -> &'static str {
        self.pick("❌ Enter a valid number or 'cancel'.", "❌ Escribe un número válido o 'cancelar'.")
    }

    pub fn enter_number_or_buttons(&self) -> &'static str {
        self.pick("❌ Enter a valid number or use the buttons.", "❌ Escribe un número válido o usa los botones.")
    }

    pub fn out_of_range(&self) -> &'static str {
        self.pick("⚠️ Number out of range.", "⚠️ Número fuera de rango.")
    }

    pub fn yes(&self) -> &'static str { self.pick("Yes", "Sí") }

    pub fn no(&self) -> &'static str { self.pick("No", "No") }

    // --- callback toasts ---

    pub fn unrecognised_action(&self) -> &'static str { self.pick("Unrecognised action.", "Acción no reconocida.") }

    pub fn invalid_context(&self) -> &'static str { self.pick("Invalid context", "Contexto inválido") }

    pub fn index_out_of_range(&self) -> &'static str { self.pick("Index out of range", "Índice fuera de rango") }

    pub fn invalid_path(&self) -> &'static str { self.pick("❌ Invalid path.", "❌ Ruta inválida.") }

    pub fn selected(&self, flow: FlowKind, relative: &str) -> String {
        match (self.locale, flow) {
            (Locale::En, FlowKind::Go) => format!("Folder selected: {relative}/"),
            (Locale::Es, FlowKind::Go) => format!("Carpeta seleccionada: {relative}/"),
            (Locale::En, FlowKind::Rename) => format!("File selected: {relative}"),
            (Locale::Es, FlowKind::Rename) => format!("Archivo seleccionado: {relative}"),
            (Locale::En, _) => format!("Selected: {relative}"),
            (Locale::Es, _) => format!("Seleccionado: {relative}"),
        }
    }

    // --- browser ---

    pub fn empty_marker(&self) -> &'static str { self.pick("(empty)", "(vacío)") }

    pub fn matches_header(&self, count: usize) -> String {
        match self.locale {
            Locale::En => format!("🔍 There are {count} matches:"),
            Locale::Es => format!("🔍 Existen {count} coincidencias:"),
        }
    }

    pub fn browser_selection_prompt(&self, kind: AreaKind) -> String {
        match self.locale {
            Locale::En => format!(
                "Choose a {} by tapping a button or reply with /show <number> (or just the number).",
                self.item_label(kind, false)
            ),
            Locale::Es => format!(
                "Elige {} {} tocando un botón o responde con /show <número> (o solo el número).",
                if kind == AreaKind::Photos { "la" } else { "el" },
                self.item_label(kind, false)
            ),
        }
    }

    pub fn show_usage(&self, kind: AreaKind) -> String {
        match self.locale {
            Locale::En => format!("⚠️ Give part of the {} name. Example: /show lake", self.item_label(kind, false)),
            Locale::Es => format!("⚠️ Debes indicar parte del nombre del {}. Ejemplo: /show lago", self.item_label(kind, false)),
        }
    }

    pub fn show_none(&self, kind: AreaKind) -> String {
        match self.locale {
            Locale::En => format!("❌ No {} with that name in this directory.", self.item_label(kind, true)),
            Locale::Es => format!("❌ No encontré {} con ese nombre en este directorio.", self.item_label(kind, true)),
        }
    }

    pub fn go_usage(&self) -> &'static str {
        self.pick("⚠️ Use: go <directory> or go..", "⚠️ Usa: go <directorio> o go..")
    }

    pub fn dir_not_found(&self, target: &str) -> String {
        match self.locale {
            Locale::En => format!("❌ Directory '{target}' not found."),
            Locale::Es => format!("❌ No encontré el directorio '{target}'."),
        }
    }

    pub fn already_root(&self) -> &'static str {
        self.pick("🔝 You are already at the root directory.", "🔝 Ya estás en el directorio raíz.")
    }

    pub fn file_missing(&self, name: &str) -> String {
        match self.locale {
            Locale::En => format!("❌ File does not exist: {name}"),
            Locale::Es => format!("❌ El archivo no existe: {name}"),
        }
    }

    pub fn file_empty(&self, name: &str) -> String {
        match self.locale {
            Locale::En => format!("⚠️ The file {name} is empty."),
            Locale::Es => format!("⚠️ El archivo {name} está vacío."),
        }
    }

    pub fn photo_fallback(&self, reason: &str) -> String {
        match self.locale {
            Locale::En => format!("⚠️ Could not send as photo ({reason}). Trying as file..."),
            Locale::Es => format!("⚠️ No se pudo enviar como foto ({reason}). Probando como archivo..."),
        }
    }

    pub fn send_failed(&self, reason: &str) -> String {
        match self.locale {
            Locale::En => format!("❌ Failed to send the file: {reason}"),
            Locale::Es => format!("❌ Error al enviar el archivo: {reason}"),
        }
    }

    // --- directory jump ---

    pub fn go_none(&self) -> &'static str {
        self.pick("❌ No folders found with that name.", "❌ No hay carpetas con ese nombre.")
    }

    pub fn go_header(&self, count: usize) -> String {
        match self.locale {
            Locale::En => format!("🔍 Matches found ({count}):"),
            Locale::Es => format!("🔍 Coincidencias encontradas ({count}):"),
        }
    }

    pub fn go_prompt(&self) -> &'static str {
        self.pick(
            "Choose a folder using the buttons or reply with its number (or send 'cancel').",
            "Elige una carpeta con los botones o responde con su número (o envía 'cancelar').",
        )
    }

    // --- delete ---

    pub fn delete_usage(&self, kind: AreaKind) -> String {
        match self.locale {
            Locale::En => format!("⚠️ Use: /rm{} <name_pattern>", Self::cmd_suffix(kind)),
            Locale::Es => format!("⚠️ Usa: /rm{} <patrón_de_nombre>", Self::cmd_suffix(kind)),
        }
    }

    pub fn delete_none(&self, kind: AreaKind, pattern: &str) -> String {
        match self.locale {
            Locale::En => format!("❌ No {} or folders matched '{pattern}'.", self.item_label(kind, true)),
            Locale::Es => format!("❌ Ningún {} o carpeta coincide con '{pattern}'.", self.item_label(kind, false)),
        }
    }

    pub fn delete_prompt(&self) -> &'static str {
        self.pick(
            "Reply with the number to delete or use the buttons (you can also send 'cancel').",
            "Responde con el número a borrar o usa los botones (también puedes enviar 'cancelar').",
        )
    }

    pub fn delete_confirm(&self, emoji: &str, relative: &str) -> String {
        match self.locale {
            Locale::En => format!("Delete {emoji} {relative}? This action cannot be undone."),
            Locale::Es => format!("¿Borrar {emoji} {relative}? Esta acción no se puede deshacer."),
        }
    }

    pub fn use_confirm_buttons(&self) -> &'static str {
        self.pick("Use the confirmation buttons to continue.", "Usa los botones de confirmación para continuar.")
    }

    pub fn deleted(&self, relative: &str) -> String {
        match self.locale {
            Locale::En => format!("🗑️ Deleted: {relative}"),
            Locale::Es => format!("🗑️ Borrado: {relative}"),
        }
    }

    // --- move ---

    pub fn move_usage(&self, kind: AreaKind) -> String {
        match self.locale {
            Locale::En => format!("⚠️ Use: /mv{} <origin> <destination>, or /mv{} alone for the assistant", Self::cmd_suffix(kind), Self::cmd_suffix(kind)),
            Locale::Es => format!("⚠️ Usa: /mv{} <origen> <destino>, o solo /mv{} para el asistente", Self::cmd_suffix(kind), Self::cmd_suffix(kind)),
        }
    }

    pub fn move_start(&self, area_name: &str) -> String {
        match self.locale {
            Locale::En => format!("Send part of the source name in {area_name} (or type 'cancel')."),
            Locale::Es => format!("Envía parte del nombre del origen en {area_name} (o escribe 'cancelar')."),
        }
    }

    pub fn move_origin_none(&self) -> &'static str {
        self.pick("❌ No matches found for the source.", "❌ No hay coincidencias para el origen.")
    }

    pub fn move_origin_header(&self, count: usize) -> String {
        match self.locale {
            Locale::En => format!("🔍 Matches for the source ({count}):"),
            Locale::Es => format!("🔍 Coincidencias para el origen ({count}):"),
        }
    }

    pub fn move_origin_prompt(&self) -> &'static str {
        self.pick(
            "Reply with the number of the source or use the buttons (you can also send 'cancel').",
            "Responde con el número del origen o usa los botones (también puedes enviar 'cancelar').",
        )
    }

    pub fn move_destination_prompt(&self, area_name: &str) -> String {
        match self.locale {
            Locale::En => format!(
                "Now send part of the destination folder name in {area_name} (send 'cancel' to stop; use '.' for the root folder)."
            ),
            Locale::Es => format!(
                "Ahora envía parte del nombre de la carpeta destino en {area_name} (envía 'cancelar' para parar; usa '.' para la raíz)."
            ),
        }
    }

    pub fn move_destination_none(&self) -> &'static str {
        self.pick(
            "❌ No matches found for the destination. Try again.",
            "❌ No hay coincidencias para el destino. Inténtalo de nuevo.",
        )
    }

    pub fn move_destination_header(&self, count: usize) -> String {
        match self.locale {
            Locale::En => format!("🔍 Possible destinations ({count}):"),
            Locale::Es => format!("🔍 Destinos posibles ({count}):"),
        }
    }

    pub fn move_destination_choice_prompt(&self) -> &'static str {
        self.pick(
            "Reply with the number of the destination or use the buttons (you can also send 'cancel').",
            "Responde con el número del destino o usa los botones (también puedes enviar 'cancelar').",
        )
    }

    pub fn moved(&self, origin: &str, destination: &str) -> String {
        match self.locale {
            Locale::En => format!("📦 Moved:\n{origin} → {destination}"),
            Locale::Es => format!("📦 Movido:\n{origin} → {destination}"),
        }
    }

    // --- rename ---

    pub fn rename_start(&self, area_name: &str) -> String {
        match self.locale {
            Locale::En => format!("Send part of the file name in {area_name} that you'd like to rename (or type 'cancel')."),
            Locale::Es => format!("Envía parte del nombre del archivo en {area_name} que quieres renombrar (o escribe 'cancelar')."),
        }
    }

    pub fn rename_none(&self) -> &'static str {
        self.pick("❌ No files found with that name.", "❌ No hay archivos con ese nombre.")
    }

    pub fn rename_prompt(&self) -> &'static str {
        self.pick(
            "Reply with the number of the file to rename or use the buttons (you can also send 'cancel').",
            "Responde con el número del archivo a renombrar o usa los botones (también puedes enviar 'cancelar').",
        )
    }

    pub fn rename_new_name(&self) -> &'static str {
        self.pick(
            "Type the new name (without a path). The original extension is kept unless you give one.",
            "Escribe el nuevo nombre (sin ruta). Se conserva la extensión original salvo que indiques otra.",
        )
    }

    pub fn renamed(&self, old: &str, new: &str) -> String {
        match self.locale {
            Locale::En => format!("🔤 Renamed:\n{old} → {new}"),
            Locale::Es => format!("🔤 Renombrado:\n{old} → {new}"),
        }
    }

    // --- mkdir and uploads ---

    pub fn mkdir_usage(&self, kind: AreaKind) -> String {
        match self.locale {
            Locale::En => format!("⚠️ Use: /mkdir{} <name/directory>", Self::cmd_suffix(kind)),
            Locale::Es => format!("⚠️ Usa: /mkdir{} <nombre/directorio>", Self::cmd_suffix(kind)),
        }
    }

    pub fn dir_created(&self, relative: &str) -> String {
        match self.locale {
            Locale::En => format!("📁 Directory created: {relative}"),
            Locale::Es => format!("📁 Directorio creado: {relative}"),
        }
    }

    pub fn saved_in(&self, kind: AreaKind, dir: &str) -> String {
        match (self.locale, kind) {
            (Locale::En, AreaKind::Photos) => format!("🖼️ Images saved in:\n{dir}"),
            (Locale::Es, AreaKind::Photos) => format!("🖼️ Imágenes guardadas en:\n{dir}"),
            (Locale::En, AreaKind::Documents) => format!("📂 Files saved in:\n{dir}"),
            (Locale::Es, AreaKind::Documents) => format!("📂 Archivos guardados en:\n{dir}"),
        }
    }

    pub fn download_failed(&self, reason: &str) -> String {
        match self.locale {
            Locale::En => format!("❌ Could not save the file: {reason}"),
            Locale::Es => format!("❌ No se pudo guardar el archivo: {reason}"),
        }
    }

    /// Render a domain error for the user.
    pub fn error(&self, err: &FileOpError) -> String {
        match (self.locale, err) {
            (Locale::En, FileOpError::OutOfBounds(p)) => format!("❌ Path outside the base directory: {p}"),
            (Locale::Es, FileOpError::OutOfBounds(p)) => format!("❌ Ruta fuera del directorio base: {p}"),
            (Locale::En, FileOpError::NotFound(p)) => format!("❌ Does not exist: {p}"),
            (Locale::Es, FileOpError::NotFound(p)) => format!("❌ No existe: {p}"),
            (Locale::En, FileOpError::Collision { is_dir: true }) => {
                "❌ A directory with that name already exists at the destination.".to_string()
            }
            (Locale::Es, FileOpError::Collision { is_dir: true }) => {
                "❌ Ya existe un directorio con ese nombre en el destino.".to_string()
            }
            (Locale::En, FileOpError::Collision { is_dir: false }) => {
                "❌ A file with that name already exists at the destination.".to_string()
            }
            (Locale::Es, FileOpError::Collision { is_dir: false }) => {
                "❌ Ya existe un archivo con ese nombre en el destino.".to_string()
            }
            (Locale::En, FileOpError::BaseDirectoryProtected) => "❌ The base directory cannot be changed.".to_string(),
            (Locale::Es, FileOpError::BaseDirectoryProtected) => "❌ No se puede modificar el directorio base.".to_string(),
            (Locale::En, FileOpError::Unsupported(what)) => format!("❌ Not supported: {what}. You can only rename files."),
            (Locale::Es, FileOpError::Unsupported(what)) => format!("❌ No soportado: {what}. Solo puedes renombrar archivos."),
            (Locale::En, FileOpError::IntoItself) => "❌ A folder cannot be moved inside itself.".to_string(),
            (Locale::Es, FileOpError::IntoItself) => "❌ No se puede mover una carpeta dentro de sí misma.".to_string(),
            (_, FileOpError::Range { .. }) => self.out_of_range().to_string(),
            (_, FileOpError::Format) => self.enter_number().to_string(),
            (Locale::En, FileOpError::TransportLimit { limit }) => format!(
                "❌ The file exceeds the bot download limit ({} MB). Compress or split it before sending again.",
                limit / (1024 * 1024)
            ),
            (Locale::Es, FileOpError::TransportLimit { limit }) => format!(
                "❌ El archivo supera el límite de descarga del bot ({} MB). Comprímelo o divídelo antes de reenviarlo.",
                limit / (1024 * 1024)
            ),
            (Locale::En, FileOpError::EmptyName) => "❌ Invalid name.".to_string(),
            (Locale::Es, FileOpError::EmptyName) => "❌ Nombre inválido.".to_string(),
            (Locale::En, FileOpError::NoOp) => "⚠️ The destination is the same as the source.".to_string(),
            (Locale::Es, FileOpError::NoOp) => "⚠️ El destino es igual al origen.".to_string(),
            (Locale::En, FileOpError::MissingParent) => "❌ The destination directory doesn't exist.".to_string(),
            (Locale::Es, FileOpError::MissingParent) => "❌ El directorio destino no existe.".to_string(),
            (Locale::En, FileOpError::Io(e)) => format!("❌ Operation failed: {e}"),
            (Locale::Es, FileOpError::Io(e)) => format!("❌ Falló la operación: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_words_in_any_locale() {
        for word in ["cancel", "CANCELAR", " salir ", "Stop"] {
            assert!(is_cancel_word(word), "{word}");
        }
        assert!(!is_cancel_word("1"));
    }

    #[test]
    fn locale_parsing() {
        assert_eq!("ES".parse::<Locale>().unwrap(), Locale::Es);
        assert_eq!("english".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn errors_render_per_locale() {
        let en = Texts::new(Locale::En);
        let es = Texts::new(Locale::Es);
        assert!(en.error(&FileOpError::MissingParent).contains("doesn't exist"));
        assert_eq!(en.error(&FileOpError::IntoItself), "❌ A folder cannot be moved inside itself.");
        assert!(!en.error(&FileOpError::IntoItself).contains("rename"));
        assert!(es.error(&FileOpError::NoOp).contains("igual al origen"));
        assert_eq!(en.error(&FileOpError::Range { max: 3 }), en.out_of_range());
    }
}
